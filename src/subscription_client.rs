use crate::config::Config;
use crate::debug_log::{DebugEntry, DebugLogger, Exchange};
use crate::errors::LookupError;
use crate::models::{FilterLogic, LookupRequest, LookupResult, NO_SUBSCRIPTIONS_FOUND};
use crate::soap::{self, SoapResponse};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, HOST};
use std::time::Duration;

/// Client for the contract service's `readCustomerSubscriptions` operation.
///
/// Holds one HTTP client and the account configuration; clones share both.
#[derive(Clone)]
pub struct SubscriptionLookupClient {
    client: reqwest::Client,
    config: Config,
    debug_log: DebugLogger,
}

impl SubscriptionLookupClient {
    /// Creates a new `SubscriptionLookupClient`.
    ///
    /// # Arguments
    ///
    /// * `config` - Credentials, endpoint and debug log settings.
    pub fn new(config: Config) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                LookupError::InternalError(format!(
                    "Failed to create subscription service client: {}",
                    e
                ))
            })?;

        let debug_log = DebugLogger::new(config.debug_log_path.clone());

        Ok(Self {
            client,
            config,
            debug_log,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the customer with this email and zip code has open subscriptions.
    ///
    /// Never fails: lookup errors are logged and answered with `false`.
    pub async fn has_subscriptions(&self, email: &str, zip_code: &str) -> bool {
        self.subscription_count(email, zip_code).await > 0
    }

    /// Whether the customer with this number has open subscriptions.
    ///
    /// Never fails: lookup errors are logged and answered with `false`.
    pub async fn has_subscriptions_by_customer_number(&self, customer_number: &str) -> bool {
        self.subscription_count_by_customer_number(customer_number)
            .await
            > 0
    }

    /// Number of subscriptions found by email and zip code, zero on any failure.
    pub async fn subscription_count(&self, email: &str, zip_code: &str) -> usize {
        match self.get_customer_subscriptions(email, zip_code, None).await {
            Ok(result) => result.count(),
            Err(e) => {
                tracing::warn!("Subscription lookup by email/zip failed: {}", e);
                0
            }
        }
    }

    /// Number of subscriptions found by customer number, zero on any failure.
    pub async fn subscription_count_by_customer_number(&self, customer_number: &str) -> usize {
        match self
            .get_customer_subscriptions_by_customer_number(customer_number, None)
            .await
        {
            Ok(result) => result.count(),
            Err(e) => {
                tracing::warn!(
                    "Subscription lookup for customer {} failed: {}",
                    customer_number,
                    e
                );
                0
            }
        }
    }

    /// Gets the subscriptions of the customer with this email and zip code.
    ///
    /// # Arguments
    ///
    /// * `email` - Customer email address.
    /// * `zip_code` - Customer postal code.
    /// * `filter_logic` - Contract filter; `None` leaves closed contracts out.
    ///
    /// # Returns
    ///
    /// * `Result<LookupResult, LookupError>` - `NotFound` when the service reports
    ///   no subscriptions, an error for every other fault.
    pub async fn get_customer_subscriptions(
        &self,
        email: &str,
        zip_code: &str,
        filter_logic: Option<FilterLogic>,
    ) -> Result<LookupResult, LookupError> {
        let request = LookupRequest::by_email(email, zip_code, filter_logic)?;
        self.lookup(&request).await
    }

    /// Gets the subscriptions of the customer with this customer number.
    ///
    /// # Arguments
    ///
    /// * `customer_number` - Customer number as printed on invoices.
    /// * `filter_logic` - Contract filter; `None` leaves closed contracts out.
    pub async fn get_customer_subscriptions_by_customer_number(
        &self,
        customer_number: &str,
        filter_logic: Option<FilterLogic>,
    ) -> Result<LookupResult, LookupError> {
        let request = LookupRequest::by_customer_number(customer_number, filter_logic)?;
        self.lookup(&request).await
    }

    /// Sends one `readCustomerSubscriptions` call and interprets the answer.
    ///
    /// With debug logging enabled the raw exchange is appended to the debug
    /// log whatever the outcome. Failing to write the log does not fail the
    /// lookup.
    pub async fn lookup(&self, request: &LookupRequest) -> Result<LookupResult, LookupError> {
        let envelope =
            soap::build_envelope(&self.config.namespace, &self.config.credentials, request)?;

        tracing::info!(
            "Reading subscriptions for {} (filter {})",
            request.describe(),
            request.filter_logic().as_str()
        );

        let mut exchange = Exchange::default();
        let outcome = self.call(envelope, &mut exchange).await;

        if self.config.debug_enabled {
            if let Err(e) = self.debug_log.append(&DebugEntry::new(exchange)).await {
                tracing::warn!(
                    "Failed to write debug log {}: {}",
                    self.debug_log.path().display(),
                    e
                );
            }
        }

        match outcome? {
            SoapResponse::Subscriptions(records) => {
                tracing::info!(
                    "✓ {} subscription(s) found for {}",
                    records.len(),
                    request.describe()
                );
                Ok(LookupResult::Found(records))
            }
            SoapResponse::Fault(fault) if fault.code() == NO_SUBSCRIPTIONS_FOUND => {
                tracing::info!("No subscriptions found for {}", request.describe());
                Ok(LookupResult::NotFound)
            }
            SoapResponse::Fault(fault) => {
                tracing::error!(
                    "Subscription service fault for {}: {}",
                    request.describe(),
                    fault.message
                );
                Err(LookupError::RemoteFault {
                    code: fault.code().to_string(),
                    message: fault.message,
                })
            }
        }
    }

    /// Performs the HTTP round trip, recording both directions in `exchange`.
    async fn call(
        &self,
        envelope: String,
        exchange: &mut Exchange,
    ) -> Result<SoapResponse, LookupError> {
        let mut request = self
            .client
            .post(&self.config.endpoint)
            .header(CONTENT_TYPE, soap::CONTENT_TYPE)
            .header("SOAPAction", soap::SOAP_ACTION)
            .header(CONTENT_LENGTH, envelope.len())
            .body(envelope.clone())
            .build()
            .map_err(|e| {
                LookupError::ExternalApiError(format!("Failed to build SOAP request: {}", e))
            })?;

        // Set here rather than by the connector so the debug log shows it.
        if let Some(host) = host_header(request.url()) {
            request.headers_mut().insert(HOST, host);
        }

        exchange.request_line = format!("{} {}", request.method(), request.url());
        exchange.request_headers = render_headers(request.headers());
        exchange.request_body = envelope;
        tracing::debug!("POST {} ({})", request.url(), soap::OPERATION);

        let response = self.client.execute(request).await.map_err(|e| {
            LookupError::ExternalApiError(format!("Subscription service request failed: {}", e))
        })?;

        let status = response.status();
        exchange.response_status_line = format!("{:?} {}", response.version(), status);
        exchange.response_headers = render_headers(response.headers());

        let body = response.text().await.map_err(|e| {
            LookupError::ExternalApiError(format!(
                "Failed to read subscription service response: {}",
                e
            ))
        })?;
        exchange.response_body = body.clone();

        // Faults usually arrive with HTTP 500, so the body is read before the status.
        match soap::parse_response(&body) {
            Ok(SoapResponse::Subscriptions(_)) if !status.is_success() => {
                Err(LookupError::ExternalApiError(format!(
                    "Subscription service returned {}",
                    status
                )))
            }
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(LookupError::ExternalApiError(format!(
                "Subscription service returned {}: {}",
                status, body
            ))),
            Err(e) => Err(e),
        }
    }
}

fn host_header(url: &reqwest::Url) -> Option<HeaderValue> {
    let host = url.host_str()?;
    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    HeaderValue::from_str(&authority).ok()
}

fn render_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            format!(
                "{}: {}",
                name,
                value.to_str().unwrap_or("<non-ascii header value>")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use reqwest::header::HeaderValue;

    #[tokio::test]
    async fn test_client_creation() {
        let client = SubscriptionLookupClient::new(Config::new(Credentials::new("u", "p", "1")));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_blank_email_is_bad_request_and_has_is_false() {
        let client =
            SubscriptionLookupClient::new(Config::new(Credentials::new("u", "p", "1"))).unwrap();

        let result = client.get_customer_subscriptions("", "12345", None).await;
        assert!(matches!(result, Err(LookupError::BadRequest(_))));
        assert!(!client.has_subscriptions("", "12345").await);
    }

    #[test]
    fn test_host_header_keeps_explicit_port() {
        let url = reqwest::Url::parse("http://127.0.0.1:8081/ContractService/Contract").unwrap();
        assert_eq!(host_header(&url).unwrap(), "127.0.0.1:8081");

        let url = reqwest::Url::parse("https://epsb-ws.verlagsinfo.de/epsb-ws").unwrap();
        assert_eq!(host_header(&url).unwrap(), "epsb-ws.verlagsinfo.de");
    }

    #[test]
    fn test_render_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/xml"));
        headers.insert("soapaction", HeaderValue::from_static("\"\""));
        let rendered = render_headers(&headers);
        assert!(rendered.contains("content-type: text/xml"));
        assert!(rendered.contains("soapaction: \"\""));
        assert_eq!(rendered.lines().count(), 2);
    }
}
