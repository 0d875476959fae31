// ABOUTME: Root library for the deskchat terminal client
// ABOUTME: Wires config into gateway transports, the REST backend, and the ratatui front end

pub mod config;
pub mod paths;
pub mod rest;
pub mod transport;
pub mod tui;

use std::sync::Arc;

use anyhow::Result;
use deskchat_core::connection::ConnectionManager;

use crate::config::GatewayConfig;
use crate::rest::RestBackend;

/// Connection to the realtime gateway for the admin or customer surface
pub fn connection_manager(gateway: &GatewayConfig, admin: bool) -> Result<ConnectionManager> {
    let connectors = transport::build_connectors(gateway)?;
    Ok(ConnectionManager::new(
        connectors,
        gateway.connection_config(admin),
    ))
}

pub fn rest_backend(gateway: &GatewayConfig) -> Result<Arc<RestBackend>> {
    let cookie = gateway.credentials().map(str::to_string);
    Ok(Arc::new(RestBackend::new(&gateway.url, cookie)?))
}
