use reqwest::Client;

const APP_USER_AGENT: &str = concat!("mclibs/", env!("CARGO_PKG_VERSION"));

/// Client used for every transfer: plain GETs, default redirect policy,
/// no timeouts.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder().user_agent(APP_USER_AGENT).build()
}
