use std::collections::BTreeMap;

use abi::{Error, FailurePolicy, RoomShortage, RoomType, Stay, StayWindow};
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::RoomInventory;

/// Outcome of an availability lookup. `Unknown` means the store could not be
/// reached, which is not the same thing as zero units left.
#[derive(Debug, PartialEq)]
pub enum Availability {
    Available { units: u32, tightest_day: NaiveDate },
    Unknown(String),
    Error(Error),
}

/// Units held on `date` by stays in a holding status.
pub fn committed_units_on(stays: &[Stay], date: NaiveDate) -> u32 {
    stays
        .iter()
        .filter(|stay| stay.holds_inventory() && stay.window.contains(date))
        .fold(0u32, |acc, stay| acc.saturating_add(stay.rooms_booked))
}

pub fn compute_availability(total_units: u32, stays: &[Stay], date: NaiveDate) -> u32 {
    total_units.saturating_sub(committed_units_on(stays, date))
}

/// Smallest availability over every night of `window`, together with the
/// first night on which it occurs.
pub fn compute_range_availability(
    total_units: u32,
    stays: &[Stay],
    window: &StayWindow,
) -> (u32, NaiveDate) {
    // occupancy only changes on check-in and check-out days
    let mut changes: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for stay in stays
        .iter()
        .filter(|stay| stay.holds_inventory() && stay.window.overlaps(window))
    {
        let rooms = stay.rooms_booked as i64;
        let from = stay.window.check_in().max(window.check_in());
        *changes.entry(from).or_default() += rooms;
        if stay.window.check_out() < window.check_out() {
            *changes.entry(stay.window.check_out()).or_default() -= rooms;
        }
    }

    let mut held = 0i64;
    let mut peak = 0i64;
    let mut tightest_day = window.check_in();
    for (day, delta) in changes {
        held += delta;
        if held > peak {
            peak = held;
            tightest_day = day;
        }
    }

    let available = (total_units as i64 - peak).max(0) as u32;
    (available, tightest_day)
}

/// Fails with `InsufficientInventory` when `request` needs more units than
/// the tightest night of its window has left.
pub fn check_capacity(
    room_type_id: &str,
    total_units: u32,
    stays: &[Stay],
    request: &Stay,
) -> Result<(), Error> {
    let (available, day) = compute_range_availability(total_units, stays, &request.window);
    if request.rooms_booked > available {
        return Err(Error::InsufficientInventory(RoomShortage {
            room_type_id: room_type_id.to_string(),
            day,
            requested: request.rooms_booked,
            available,
        }));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct AvailabilityCalculator<S> {
    store: S,
    policy: FailurePolicy,
}

impl<S> AvailabilityCalculator<S>
where
    S: RoomInventory + Send + Sync,
{
    pub fn new(store: S, policy: FailurePolicy) -> Self {
        Self { store, policy }
    }

    /// Free units of the room type on `date` (today when `None`).
    pub async fn available_on(
        &self,
        room_type_id: &str,
        total_units: u32,
        date: Option<NaiveDate>,
    ) -> Availability {
        let date = date.unwrap_or_else(abi::today);
        match StayWindow::single_day(date) {
            Ok(window) => self.available_during(room_type_id, total_units, window).await,
            Err(e) => Availability::Error(e),
        }
    }

    pub async fn available_during(
        &self,
        room_type_id: &str,
        total_units: u32,
        window: StayWindow,
    ) -> Availability {
        match self.store.committed_stays(room_type_id, &window).await {
            Ok(stays) => {
                let (units, tightest_day) =
                    compute_range_availability(total_units, &stays, &window);
                debug!(room_type_id, units, %tightest_day, "availability computed");
                Availability::Available {
                    units,
                    tightest_day,
                }
            }
            Err(e) if e.is_store_unavailable() => {
                self.store_unreachable(room_type_id, Some(total_units), &window, e)
            }
            Err(e) => Availability::Error(e),
        }
    }

    /// Looks up the room type's inventory first. The room type is returned
    /// alongside the result whenever it could be loaded.
    pub async fn room_type_available_on(
        &self,
        room_type_id: &str,
        date: Option<NaiveDate>,
    ) -> (Option<RoomType>, Availability) {
        let date = date.unwrap_or_else(abi::today);
        match StayWindow::single_day(date) {
            Ok(window) => self.room_type_available_during(room_type_id, window).await,
            Err(e) => (None, Availability::Error(e)),
        }
    }

    pub async fn room_type_available_during(
        &self,
        room_type_id: &str,
        window: StayWindow,
    ) -> (Option<RoomType>, Availability) {
        match self.store.get_room_type(room_type_id.to_string()).await {
            Ok(room_type) => {
                let availability = self
                    .available_during(room_type_id, room_type.total_units, window)
                    .await;
                (Some(room_type), availability)
            }
            Err(e) if e.is_store_unavailable() => (
                None,
                self.store_unreachable(room_type_id, None, &window, e),
            ),
            Err(e) => (None, Availability::Error(e)),
        }
    }

    fn store_unreachable(
        &self,
        room_type_id: &str,
        total_units: Option<u32>,
        window: &StayWindow,
        err: Error,
    ) -> Availability {
        let reason = err.to_string();
        match (self.policy, total_units) {
            (FailurePolicy::FailOpen, Some(units)) => {
                warn!(room_type_id, %reason, "reservation store unreachable, assuming every unit is free");
                Availability::Available {
                    units,
                    tightest_day: window.check_in(),
                }
            }
            _ => {
                warn!(room_type_id, %reason, "reservation store unreachable, availability unknown");
                Availability::Unknown(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abi::ReservationStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DELUXE: &str = "6f2b7c1e-8f0b-4c1a-9f5e-0a7d2c3b4e5f";

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn window(start: &str, end: &str) -> StayWindow {
        StayWindow::new(day(start), day(end)).unwrap()
    }

    fn stay(start: &str, end: &str, rooms: u32, status: ReservationStatus) -> Stay {
        Stay::new(window(start, end), rooms, status)
    }

    /// R1 books 2 units for [06-01, 06-05), R2 books 1 unit for [06-04, 06-08).
    fn scenario() -> Vec<Stay> {
        vec![
            stay("2024-06-01", "2024-06-05", 2, ReservationStatus::Confirmed),
            stay("2024-06-04", "2024-06-08", 1, ReservationStatus::Confirmed),
        ]
    }

    #[test]
    fn scenario_should_subtract_overlapping_reservations() {
        let stays = scenario();
        assert_eq!(compute_availability(5, &stays, day("2024-06-04")), 2);
        assert_eq!(compute_availability(5, &stays, day("2024-06-05")), 4);
        assert_eq!(compute_availability(5, &stays, day("2024-06-08")), 5);
    }

    #[test]
    fn availability_should_never_go_negative() {
        let stays = vec![
            stay("2024-06-01", "2024-06-03", 4, ReservationStatus::Confirmed),
            stay("2024-06-02", "2024-06-03", 3, ReservationStatus::CheckedIn),
        ];
        assert_eq!(compute_availability(5, &stays, day("2024-06-02")), 0);
        assert_eq!(compute_availability(0, &stays, day("2024-06-01")), 0);
        let (units, tightest) = compute_range_availability(5, &stays, &window("2024-06-01", "2024-06-03"));
        assert_eq!((units, tightest), (0, day("2024-06-02")));
    }

    #[test]
    fn non_overlapping_reservation_should_not_count() {
        let stays = vec![
            stay("2024-05-01", "2024-05-10", 3, ReservationStatus::Confirmed),
            stay("2024-06-10", "2024-06-12", 3, ReservationStatus::CheckedIn),
        ];
        assert_eq!(compute_availability(5, &stays, day("2024-06-04")), 5);
        let (units, _) = compute_range_availability(5, &stays, &window("2024-06-01", "2024-06-10"));
        assert_eq!(units, 5);
    }

    #[test]
    fn only_holding_statuses_should_count() {
        for status in [
            ReservationStatus::Pending,
            ReservationStatus::Cancelled,
            ReservationStatus::CheckedOut,
            ReservationStatus::Unknown,
        ] {
            let stays = vec![stay("2024-06-01", "2024-06-05", 3, status)];
            assert_eq!(compute_availability(5, &stays, day("2024-06-02")), 5);
        }
        let stays = vec![stay("2024-06-01", "2024-06-05", 3, ReservationStatus::CheckedIn)];
        assert_eq!(compute_availability(5, &stays, day("2024-06-02")), 2);
    }

    #[test]
    fn check_out_day_is_free_and_check_in_day_is_blocked() {
        let stays = vec![stay("2024-06-01", "2024-06-05", 1, ReservationStatus::Confirmed)];
        assert_eq!(compute_availability(1, &stays, day("2024-06-05")), 1);
        assert_eq!(compute_availability(1, &stays, day("2024-06-01")), 0);
    }

    #[test]
    fn repeated_calls_should_agree() {
        let stays = scenario();
        let first = compute_availability(5, &stays, day("2024-06-04"));
        let second = compute_availability(5, &stays, day("2024-06-04"));
        assert_eq!(first, second);
    }

    #[test]
    fn range_should_report_tightest_day() {
        let stays = scenario();
        let (units, tightest) =
            compute_range_availability(5, &stays, &window("2024-06-01", "2024-06-08"));
        assert_eq!(units, 2);
        assert_eq!(tightest, day("2024-06-04"));

        let (units, tightest) =
            compute_range_availability(5, &stays, &window("2024-06-05", "2024-06-08"));
        assert_eq!(units, 4);
        assert_eq!(tightest, day("2024-06-05"));
    }

    #[test]
    fn stored_stay_longer_than_a_lookup_should_still_count() {
        let long = StayWindow::stored(day("2024-01-01"), day("2025-06-01")).unwrap();
        let stays = vec![Stay::new(long, 2, ReservationStatus::Confirmed)];
        assert_eq!(compute_availability(5, &stays, day("2024-06-04")), 3);
        let (units, tightest) =
            compute_range_availability(5, &stays, &window("2024-06-01", "2024-06-08"));
        assert_eq!(units, 3);
        assert_eq!(tightest, day("2024-06-01"));
    }

    #[test]
    fn range_should_match_per_day_minimum() {
        let stays = vec![
            stay("2024-06-01", "2024-06-03", 2, ReservationStatus::Confirmed),
            stay("2024-06-02", "2024-06-06", 1, ReservationStatus::Confirmed),
            stay("2024-06-05", "2024-06-09", 3, ReservationStatus::CheckedIn),
            stay("2024-06-03", "2024-06-04", 4, ReservationStatus::Cancelled),
        ];
        let w = window("2024-05-30", "2024-06-10");
        let expected = w
            .check_in()
            .iter_days()
            .take_while(|d| *d < w.check_out())
            .map(|d| compute_availability(6, &stays, d))
            .min()
            .unwrap();
        let (units, tightest) = compute_range_availability(6, &stays, &w);
        assert_eq!(units, expected);
        assert_eq!(compute_availability(6, &stays, tightest), expected);
    }

    #[test]
    fn single_day_range_should_match_point_lookup() {
        let stays = scenario();
        for d in ["2024-05-31", "2024-06-01", "2024-06-04", "2024-06-05", "2024-06-07"] {
            let (units, _) =
                compute_range_availability(5, &stays, &StayWindow::single_day(day(d)).unwrap());
            assert_eq!(units, compute_availability(5, &stays, day(d)));
        }
    }

    #[test]
    fn capacity_check_should_use_tightest_day() {
        let stays = scenario();
        let too_many = stay("2024-06-01", "2024-06-08", 3, ReservationStatus::Pending);
        let err = check_capacity(DELUXE, 5, &stays, &too_many).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientInventory(RoomShortage {
                room_type_id: DELUXE.to_string(),
                day: day("2024-06-04"),
                requested: 3,
                available: 2,
            })
        );

        let fits = stay("2024-06-05", "2024-06-08", 3, ReservationStatus::Confirmed);
        assert_eq!(check_capacity(DELUXE, 5, &stays, &fits), Ok(()));
    }

    struct FakeInventory {
        room_types: Vec<RoomType>,
        stays: Vec<(String, Stay)>,
        unreachable: bool,
        queries: AtomicUsize,
    }

    impl FakeInventory {
        fn new(stays: Vec<Stay>) -> Self {
            let mut deluxe = RoomType::new("seaside-inn", "Deluxe King", 5);
            deluxe.id = DELUXE.to_string();
            Self {
                room_types: vec![deluxe],
                stays: stays.into_iter().map(|s| (DELUXE.to_string(), s)).collect(),
                unreachable: false,
                queries: AtomicUsize::new(0),
            }
        }

        fn unreachable() -> Self {
            Self {
                unreachable: true,
                ..Self::new(vec![])
            }
        }

        fn check_reachable(&self) -> Result<(), Error> {
            if self.unreachable {
                return Err(sqlx::Error::PoolTimedOut.into());
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RoomInventory for FakeInventory {
        async fn create_room_type(&self, _room_type: RoomType) -> Result<RoomType, Error> {
            Err(Error::Unknown)
        }

        async fn get_room_type(&self, id: String) -> Result<RoomType, Error> {
            self.check_reachable()?;
            self.room_types
                .iter()
                .find(|rt| rt.id == id)
                .cloned()
                .ok_or(Error::NotFound)
        }

        async fn list_room_types(&self, property_id: String) -> Result<Vec<RoomType>, Error> {
            self.check_reachable()?;
            Ok(self
                .room_types
                .iter()
                .filter(|rt| rt.property_id == property_id)
                .cloned()
                .collect())
        }

        async fn committed_stays(
            &self,
            room_type_id: &str,
            window: &StayWindow,
        ) -> Result<Vec<Stay>, Error> {
            self.check_reachable()?;
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .stays
                .iter()
                .filter(|(id, s)| id == room_type_id && s.holds_inventory() && s.window.overlaps(window))
                .map(|(_, s)| *s)
                .collect())
        }
    }

    #[tokio::test]
    async fn calculator_should_issue_one_query_per_lookup() {
        let calculator = AvailabilityCalculator::new(FakeInventory::new(scenario()), FailurePolicy::FailClosed);
        let ret = calculator.available_on(DELUXE, 5, Some(day("2024-06-04"))).await;
        assert_eq!(
            ret,
            Availability::Available {
                units: 2,
                tightest_day: day("2024-06-04")
            }
        );
        assert_eq!(calculator.store.queries.load(Ordering::SeqCst), 1);

        let again = calculator.available_on(DELUXE, 5, Some(day("2024-06-04"))).await;
        assert_eq!(again, ret);
    }

    #[tokio::test]
    async fn calculator_should_look_up_total_units() {
        let calculator = AvailabilityCalculator::new(FakeInventory::new(scenario()), FailurePolicy::FailClosed);
        let (room_type, ret) = calculator
            .room_type_available_during(DELUXE, window("2024-06-05", "2024-06-08"))
            .await;
        assert_eq!(room_type.unwrap().total_units, 5);
        assert_eq!(
            ret,
            Availability::Available {
                units: 4,
                tightest_day: day("2024-06-05")
            }
        );
    }

    #[tokio::test]
    async fn unknown_room_type_should_be_an_error() {
        let calculator = AvailabilityCalculator::new(FakeInventory::new(vec![]), FailurePolicy::FailOpen);
        let (room_type, ret) = calculator
            .room_type_available_on("0d9c1b8e-1111-4c1a-9f5e-0a7d2c3b4e5f", Some(day("2024-06-04")))
            .await;
        assert!(room_type.is_none());
        assert_eq!(ret, Availability::Error(Error::NotFound));
    }

    #[tokio::test]
    async fn unreachable_store_should_be_unknown_when_failing_closed() {
        let calculator =
            AvailabilityCalculator::new(FakeInventory::unreachable(), FailurePolicy::FailClosed);
        let ret = calculator.available_on(DELUXE, 5, Some(day("2024-06-04"))).await;
        assert!(matches!(ret, Availability::Unknown(_)));
    }

    #[tokio::test]
    async fn unreachable_store_should_report_full_inventory_when_failing_open() {
        let calculator =
            AvailabilityCalculator::new(FakeInventory::unreachable(), FailurePolicy::FailOpen);
        let ret = calculator.available_on(DELUXE, 5, Some(day("2024-06-04"))).await;
        assert_eq!(
            ret,
            Availability::Available {
                units: 5,
                tightest_day: day("2024-06-04")
            }
        );

        // without the room type there is no inventory to fall back to
        let (_, ret) = calculator
            .room_type_available_on(DELUXE, Some(day("2024-06-04")))
            .await;
        assert!(matches!(ret, Availability::Unknown(_)));
    }
}
