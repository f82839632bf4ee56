//! Inert network collaborators for offline builds and tests.

use log::debug;

use crate::app::ports::{
    HttpResponse, HttpVerb, Transport, TransportError, WifiControl, WifiCredentials,
};

/// Every request fails with [`TransportError::Unreachable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn http_method(
        &mut self,
        verb: HttpVerb,
        url: &str,
        _body: Option<&str>,
        _headers: &[(&str, &str)],
        _fingerprint: Option<&str>,
    ) -> Result<HttpResponse, TransportError> {
        debug!("NullTransport: {} {} dropped", verb, url);
        Err(TransportError::Unreachable)
    }
}

/// Never connects.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullWifi;

impl WifiControl for NullWifi {
    fn init_wifi(&mut self, _credentials: &WifiCredentials<'_>) -> bool {
        false
    }

    fn stop_wifi(&mut self) {}
}
