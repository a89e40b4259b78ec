pub mod create;
pub mod deploy;
pub mod run;
pub mod serve;
pub mod upload;

#[cfg(test)]
pub(crate) mod tests {
    use mldeploy_client::{Client, Config, Token};
    use mockito::Server;
    use reqwest::Url;
    use std::time::Duration;

    /// A client sending every service's requests to `server`, polling operations without delay.
    pub fn test_client(server: &Server) -> Client {
        let base = Url::parse(&server.url()).unwrap();
        Client::new(Config {
            project: "test-project".to_owned(),
            location: "us-central1".to_owned(),
            token: Token("test-token".to_owned()),
            storage_endpoint: base.clone(),
            aiplatform_endpoint: Some(base.clone()),
            functions_endpoint: base,
            operation_poll_interval: Duration::from_millis(0),
            ..Default::default()
        })
        .unwrap()
    }
}
