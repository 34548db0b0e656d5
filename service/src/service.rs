use abi::{
    availability_response::Outcome, optional_date, required_date,
    reservation_service_server::ReservationService, AvailabilityRequest, AvailabilityResponse,
    CancelRequest, CancelResponse, CheckInRequest, CheckInResponse, CheckOutRequest,
    CheckOutResponse, ConfirmRequest, ConfirmResponse, CreateRoomTypeRequest,
    CreateRoomTypeResponse, DeleteRequest, DeleteResponse, GetRequest, GetResponse,
    GetRoomTypeRequest, GetRoomTypeResponse, ListRoomTypesRequest, ListRoomTypesResponse,
    QueryRequest, RangeAvailabilityRequest, ReserveRequest, ReserveResponse, RoomType, StayWindow,
    UpdateRequest, UpdateResponse,
};
use futures::stream;
use reservation::{Availability, RoomInventory, Rsvp};
use tonic::{Request, Response, Status};
use tracing::instrument;

use crate::{ReservationStream, RsvpService};

#[tonic::async_trait]
impl ReservationService for RsvpService {
    #[instrument(skip_all)]
    async fn reserve(
        &self,
        request: Request<ReserveRequest>,
    ) -> Result<Response<ReserveResponse>, Status> {
        let rsvp = request
            .into_inner()
            .reservation
            .ok_or_else(|| Status::invalid_argument("missing reservation"))?;
        let reservation = self.manager.reserve(rsvp).await?;
        Ok(Response::new(ReserveResponse {
            reservation: Some(reservation),
        }))
    }

    #[instrument(skip_all)]
    async fn confirm(
        &self,
        request: Request<ConfirmRequest>,
    ) -> Result<Response<ConfirmResponse>, Status> {
        let reservation = self.manager.confirm(request.into_inner().id).await?;
        Ok(Response::new(ConfirmResponse {
            reservation: Some(reservation),
        }))
    }

    #[instrument(skip_all)]
    async fn check_in(
        &self,
        request: Request<CheckInRequest>,
    ) -> Result<Response<CheckInResponse>, Status> {
        let reservation = self.manager.check_in(request.into_inner().id).await?;
        Ok(Response::new(CheckInResponse {
            reservation: Some(reservation),
        }))
    }

    #[instrument(skip_all)]
    async fn check_out(
        &self,
        request: Request<CheckOutRequest>,
    ) -> Result<Response<CheckOutResponse>, Status> {
        let reservation = self.manager.check_out(request.into_inner().id).await?;
        Ok(Response::new(CheckOutResponse {
            reservation: Some(reservation),
        }))
    }

    #[instrument(skip_all)]
    async fn cancel(
        &self,
        request: Request<CancelRequest>,
    ) -> Result<Response<CancelResponse>, Status> {
        let reservation = self.manager.cancel(request.into_inner().id).await?;
        Ok(Response::new(CancelResponse {
            reservation: Some(reservation),
        }))
    }

    async fn update(
        &self,
        request: Request<UpdateRequest>,
    ) -> Result<Response<UpdateResponse>, Status> {
        let UpdateRequest { id, note } = request.into_inner();
        let reservation = self.manager.update_note(id, note).await?;
        Ok(Response::new(UpdateResponse {
            reservation: Some(reservation),
        }))
    }

    async fn get(&self, request: Request<GetRequest>) -> Result<Response<GetResponse>, Status> {
        let reservation = self.manager.get(request.into_inner().id).await?;
        Ok(Response::new(GetResponse {
            reservation: Some(reservation),
        }))
    }

    #[instrument(skip_all)]
    async fn delete(
        &self,
        request: Request<DeleteRequest>,
    ) -> Result<Response<DeleteResponse>, Status> {
        let reservation = self.manager.delete(request.into_inner().id).await?;
        Ok(Response::new(DeleteResponse {
            reservation: Some(reservation),
        }))
    }

    type queryStream = ReservationStream;

    async fn query(
        &self,
        request: Request<QueryRequest>,
    ) -> Result<Response<Self::queryStream>, Status> {
        let query = request
            .into_inner()
            .query
            .ok_or_else(|| Status::invalid_argument("missing query"))?;
        let rsvps = self.manager.query(query).await?;
        let stream = stream::iter(rsvps.into_iter().map(Ok::<_, Status>));
        Ok(Response::new(Box::pin(stream)))
    }

    #[instrument(skip_all)]
    async fn create_room_type(
        &self,
        request: Request<CreateRoomTypeRequest>,
    ) -> Result<Response<CreateRoomTypeResponse>, Status> {
        let room_type = request
            .into_inner()
            .room_type
            .ok_or_else(|| Status::invalid_argument("missing room type"))?;
        let room_type = self.manager.create_room_type(room_type).await?;
        Ok(Response::new(CreateRoomTypeResponse {
            room_type: Some(room_type),
        }))
    }

    async fn get_room_type(
        &self,
        request: Request<GetRoomTypeRequest>,
    ) -> Result<Response<GetRoomTypeResponse>, Status> {
        let room_type = self.manager.get_room_type(request.into_inner().id).await?;
        Ok(Response::new(GetRoomTypeResponse {
            room_type: Some(room_type),
        }))
    }

    async fn list_room_types(
        &self,
        request: Request<ListRoomTypesRequest>,
    ) -> Result<Response<ListRoomTypesResponse>, Status> {
        let room_types = self
            .manager
            .list_room_types(request.into_inner().property_id)
            .await?;
        Ok(Response::new(ListRoomTypesResponse { room_types }))
    }

    #[instrument(skip_all)]
    async fn availability(
        &self,
        request: Request<AvailabilityRequest>,
    ) -> Result<Response<AvailabilityResponse>, Status> {
        let request = request.into_inner();
        let date = optional_date(request.date.as_ref())?;
        let (total_units, availability) = match request.total_units {
            Some(units) => {
                let availability = self
                    .calculator
                    .available_on(&request.room_type_id, units, date)
                    .await;
                (units, availability)
            }
            None => {
                let (room_type, availability) = self
                    .calculator
                    .room_type_available_on(&request.room_type_id, date)
                    .await;
                (total_units_of(room_type), availability)
            }
        };
        to_response(request.room_type_id, total_units, availability).map(Response::new)
    }

    #[instrument(skip_all)]
    async fn range_availability(
        &self,
        request: Request<RangeAvailabilityRequest>,
    ) -> Result<Response<AvailabilityResponse>, Status> {
        let request = request.into_inner();
        let start = required_date(request.start.as_ref(), "start")?;
        let end = required_date(request.end.as_ref(), "end")?;
        let window = StayWindow::new(start, end)?;
        let (total_units, availability) = match request.total_units {
            Some(units) => {
                let availability = self
                    .calculator
                    .available_during(&request.room_type_id, units, window)
                    .await;
                (units, availability)
            }
            None => {
                let (room_type, availability) = self
                    .calculator
                    .room_type_available_during(&request.room_type_id, window)
                    .await;
                (total_units_of(room_type), availability)
            }
        };
        to_response(request.room_type_id, total_units, availability).map(Response::new)
    }
}

fn total_units_of(room_type: Option<RoomType>) -> u32 {
    room_type.map(|rt| rt.total_units).unwrap_or_default()
}

fn to_response(
    room_type_id: String,
    total_units: u32,
    availability: Availability,
) -> Result<AvailabilityResponse, Status> {
    let (tightest_day, outcome) = match availability {
        Availability::Available {
            units,
            tightest_day,
        } => (Some(tightest_day.into()), Outcome::Available(units)),
        Availability::Unknown(reason) => (None, Outcome::Unknown(reason)),
        Availability::Error(e) => return Err(e.into()),
    };
    Ok(AvailabilityResponse {
        room_type_id,
        total_units,
        tightest_day,
        outcome: Some(outcome),
    })
}
