mod service;

use std::{net::SocketAddr, pin::Pin};

use abi::{
    reservation_service_server::ReservationServiceServer, Config, FailurePolicy, Reservation,
    ServerConfig,
};
use futures::Stream;
use reservation::{AvailabilityCalculator, ReservationManager};
use tokio::net::lookup_host;
use tonic::{codec::CompressionEncoding, transport::Server, Status};
use tracing::info;

pub struct RsvpService {
    manager: ReservationManager,
    calculator: AvailabilityCalculator<ReservationManager>,
}

type ReservationStream = Pin<Box<dyn Stream<Item = Result<Reservation, Status>> + Send>>;

impl RsvpService {
    pub fn new(manager: ReservationManager, policy: FailurePolicy) -> Self {
        Self {
            calculator: AvailabilityCalculator::new(manager.clone(), policy),
            manager,
        }
    }

    /// Connect to the database and bring its schema up to date.
    pub async fn from_config(config: &Config) -> Result<Self, anyhow::Error> {
        let manager = ReservationManager::from_config(&config.db).await?;
        manager.migrate().await?;
        Ok(Self::new(manager, config.availability.on_store_failure))
    }
}

pub async fn start_server(config: &Config) -> Result<(), anyhow::Error> {
    let addr = resolve(&config.server).await?;
    let svc = RsvpService::from_config(config).await?;
    serve(svc, addr).await
}

/// First address `server.host` resolves to; takes host names as well as IP literals.
async fn resolve(server: &ServerConfig) -> Result<SocketAddr, anyhow::Error> {
    lookup_host((server.host.as_str(), server.port))
        .await?
        .next()
        .ok_or_else(|| anyhow::anyhow!("{} did not resolve to an address", server.host))
}

pub async fn serve(svc: RsvpService, addr: SocketAddr) -> Result<(), anyhow::Error> {
    let svc = ReservationServiceServer::new(svc)
        .accept_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Gzip);

    info!(%addr, "reservation service listening");
    Server::builder().add_service(svc).serve(addr).await?;
    Ok(())
}
