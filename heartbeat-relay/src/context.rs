use crate::client::RelayClient;
use crate::config::Config;
use crate::errors::RelayError;
use crate::fanout::FanOut;
use crate::registry::Backends;

/// Everything a request needs, built once from the configuration and shared
/// read-only by all requests.
pub struct RelayContext {
    pub backends: Backends,
    pub client: RelayClient,
    pub fan_out: FanOut,
}

impl RelayContext {
    pub fn new(config: &Config) -> Result<Self, RelayError> {
        config.validate()?;
        let backends = Backends::try_new(config.backends.clone())?;
        let client = RelayClient::new(&config.timeouts)?;
        Ok(Self::from_parts(
            backends,
            client,
            config.report_secondary_failures,
        ))
    }

    pub fn from_parts(
        backends: Backends,
        client: RelayClient,
        report_secondary_failures: bool,
    ) -> Self {
        let fan_out = FanOut::new(backends.clone(), client.clone(), report_secondary_failures);
        Self {
            backends,
            client,
            fan_out,
        }
    }
}
