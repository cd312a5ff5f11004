use crate::config::{ClientConfig, Credentials};
use crate::endpoint::Endpoint;
use crate::errors::{ClientError, ResultExt};
use crate::events::{
    BindingEvent, EventKind, IpPolicy, LoanEvent, LoginEvent, MarketingEvent, ModifyEvent,
    PaymentEvent, RegisterEvent, RiskEvent, SmsEvent, TradeEvent,
};
use crate::fields::FieldMap;
use crate::ip::IpSource;
use crate::outcome::DecisionOutcome;
use crate::transport::{HttpTransport, Transport};
use std::sync::Mutex;

const CREDENTIAL_FIELDS: [&str; 2] = ["partner_code", "secret_key"];

/// Client for the remote risk decision service.
///
/// Every check builds a fresh request, performs exactly one POST and returns
/// a [`DecisionOutcome`]. There is no retry, caching or batching; a failed
/// attempt is the final outcome of that call.
pub struct DecisionClient {
    credentials: Credentials,
    endpoint: Endpoint,
    transport: Box<dyn Transport>,
    ip_source: Box<dyn IpSource>,
    last_outcome: Mutex<Option<DecisionOutcome>>,
}

impl DecisionClient {
    /// Creates a client that talks HTTPS to the configured endpoint.
    ///
    /// # Arguments
    ///
    /// * `config` - Credentials, mode and transport settings.
    /// * `ip_source` - Supplies the caller IP for each check.
    pub fn new(
        config: ClientConfig,
        ip_source: impl IpSource + 'static,
    ) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(&config).with_context(|| {
            let target = if config.dev_mode { "test" } else { "production" };
            format!("Failed to set up transport for the {} risk service", target)
        })?;
        Self::with_transport(config, transport, ip_source)
    }

    /// Creates a client over an arbitrary transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: impl Transport + 'static,
        ip_source: impl IpSource + 'static,
    ) -> Result<Self, ClientError> {
        let endpoint = match config.endpoint_override {
            Some(ref url) => Endpoint::with_override(config.dev_mode, url)?,
            None => Endpoint::new(config.dev_mode),
        };

        Ok(Self {
            credentials: config.credentials,
            endpoint,
            transport: Box::new(transport),
            ip_source: Box::new(ip_source),
            last_outcome: Mutex::new(None),
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.url()
    }

    /// Outcome of the most recent check made through this client.
    ///
    /// Shared by every caller of the client: with concurrent checks the
    /// last one to finish wins. Prefer the value returned by each check.
    pub fn last_outcome(&self) -> Option<DecisionOutcome> {
        match self.last_outcome.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Submits `event` with caller-supplied `options`.
    pub fn check<E: RiskEvent + ?Sized>(&self, event: &E, options: FieldMap) -> DecisionOutcome {
        let fields = self.build_request(event, options);
        self.dispatch(event.kind(), fields)
    }

    /// Builds the event field map: `event_id` and caller IP, then the event's
    /// base fields, then `options`, last writer wins.
    ///
    /// `event_id` is always the event's own identifier. For events with
    /// [`IpPolicy::OnRequest`] a truthy `ip_address` option is replaced by
    /// the caller IP and a falsy one is dropped.
    pub fn build_request<E: RiskEvent + ?Sized>(&self, event: &E, options: FieldMap) -> FieldMap {
        let kind = event.kind();
        let mut fields = FieldMap::new().with("event_id", kind.event_id());
        if kind.ip_policy() == IpPolicy::Always {
            fields.insert("ip_address", self.ip_source.caller_ip());
        }

        fields.merge(event.base_fields());
        fields.merge(options);
        fields.insert("event_id", kind.event_id());

        if kind.ip_policy() == IpPolicy::OnRequest {
            match fields.get("ip_address").map(|v| v.is_truthy()) {
                Some(true) => fields.insert("ip_address", self.ip_source.caller_ip()),
                Some(false) => {
                    fields.remove("ip_address");
                }
                None => {}
            }
        }

        fields
    }

    /// Attaches credentials and performs the request.
    ///
    /// Credentials go first and cannot be shadowed: event or option fields
    /// named `partner_code`/`secret_key` are discarded.
    fn dispatch(&self, kind: EventKind, fields: FieldMap) -> DecisionOutcome {
        let mut request = FieldMap::new()
            .with("partner_code", &self.credentials.partner_code)
            .with("secret_key", &self.credentials.secret_key);

        for (key, value) in fields.iter() {
            if CREDENTIAL_FIELDS.contains(&key) {
                tracing::warn!("Discarding caller-supplied '{}' on {} event", key, kind);
                continue;
            }
            request.insert_if_absent(key, value.clone());
        }

        let pairs = request.to_form_pairs();
        tracing::debug!(
            "Dispatching {} check ({} form fields) to {}",
            kind.event_id(),
            pairs.len(),
            self.endpoint.url()
        );

        let body = self.transport.post_form(self.endpoint.url(), &pairs);
        let outcome = DecisionOutcome::from_body(body.as_deref());

        match outcome.error {
            None => tracing::info!("{} check approved", kind),
            Some(ref error) => tracing::info!("{} check not approved: {}", kind, error),
        }

        match self.last_outcome.lock() {
            Ok(mut guard) => *guard = Some(outcome.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(outcome.clone()),
        }

        outcome
    }

    pub fn check_register(
        &self,
        account_login: &str,
        account_mobile: &str,
        options: FieldMap,
    ) -> DecisionOutcome {
        self.check(&RegisterEvent::new(account_login, account_mobile), options)
    }

    pub fn check_login(&self, account_login: &str, options: FieldMap) -> DecisionOutcome {
        self.check(&LoginEvent::new(account_login), options)
    }

    pub fn check_sms(&self, account_mobile: &str, options: FieldMap) -> DecisionOutcome {
        self.check(&SmsEvent::new(account_mobile), options)
    }

    /// Loan application check. Pass a truthy `ip_address` option to have the
    /// caller IP attached.
    pub fn check_loan(
        &self,
        account_name: &str,
        id_number: &str,
        account_email: &str,
        account_mobile: &str,
        options: FieldMap,
    ) -> DecisionOutcome {
        self.check(
            &LoanEvent::new(account_name, id_number, account_email, account_mobile),
            options,
        )
    }

    pub fn check_marketing(
        &self,
        account_login: &str,
        account_mobile: &str,
        options: FieldMap,
    ) -> DecisionOutcome {
        self.check(&MarketingEvent::new(account_login, account_mobile), options)
    }

    /// Trade check. `items` holds one map per line item.
    #[allow(clippy::too_many_arguments)]
    pub fn check_trade(
        &self,
        account_login: &str,
        account_mobile: &str,
        pay_amount: f64,
        pay_currency: &str,
        items_count: i64,
        items: Vec<FieldMap>,
        payee_userid: &str,
        payee_name: &str,
        payee_id_number: &str,
        payee_mobile: &str,
        deliver_mobile: &str,
        deliver_address_street: &str,
        deliver_address_county: &str,
        deliver_address_city: &str,
        deliver_address_province: &str,
        options: FieldMap,
    ) -> DecisionOutcome {
        let trade = TradeEvent::new(
            account_login,
            account_mobile,
            pay_amount,
            pay_currency,
            items_count,
            items,
            payee_userid,
            payee_name,
            payee_id_number,
            payee_mobile,
            deliver_mobile,
            deliver_address_street,
            deliver_address_county,
            deliver_address_city,
            deliver_address_province,
        );
        self.check(&trade, options)
    }

    pub fn check_payment(
        &self,
        account_login: &str,
        account_mobile: &str,
        pay_method: &str,
        pay_amount: f64,
        pay_currency: &str,
        options: FieldMap,
    ) -> DecisionOutcome {
        let payment = PaymentEvent::new(
            account_login,
            account_mobile,
            pay_method,
            pay_amount,
            pay_currency,
        );
        self.check(&payment, options)
    }

    pub fn check_binding(
        &self,
        account_login: &str,
        account_name: &str,
        id_number: &str,
        card_number: &str,
        card_binding_mobile: &str,
        options: FieldMap,
    ) -> DecisionOutcome {
        self.check(
            &BindingEvent::new(
                account_login,
                account_name,
                id_number,
                card_number,
                card_binding_mobile,
            ),
            options,
        )
    }

    pub fn check_modify(
        &self,
        account_login: &str,
        account_mobile: &str,
        card_number: &str,
        options: FieldMap,
    ) -> DecisionOutcome {
        self.check(
            &ModifyEvent::new(account_login, account_mobile, card_number),
            options,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::StaticIp;
    use crate::outcome::PARSE_ERROR_CODE;
    use std::sync::Arc;

    type Sent = Arc<Mutex<Vec<(String, Vec<(String, String)>)>>>;

    #[derive(Clone)]
    struct RecordingTransport {
        response: Option<String>,
        sent: Sent,
    }

    impl RecordingTransport {
        fn new(response: Option<&str>) -> Self {
            Self {
                response: response.map(str::to_string),
                sent: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn last_request(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().last().cloned().unwrap().1
        }

        fn last_url(&self) -> String {
            self.sent.lock().unwrap().last().cloned().unwrap().0
        }
    }

    impl Transport for RecordingTransport {
        fn post_form(&self, url: &str, fields: &[(String, String)]) -> Option<String> {
            self.sent
                .lock()
                .unwrap()
                .push((url.to_string(), fields.to_vec()));
            self.response.clone()
        }
    }

    fn value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn client_with(response: Option<&str>) -> (DecisionClient, RecordingTransport) {
        let transport = RecordingTransport::new(response);
        let client = DecisionClient::with_transport(
            ClientConfig::new("partner-1", "s3cret"),
            transport.clone(),
            StaticIp("203.0.113.7".to_string()),
        )
        .unwrap();
        (client, transport)
    }

    #[test]
    fn test_register_request_shape() {
        let (client, transport) = client_with(Some(r#"{"success": true}"#));
        let outcome = client.check_register("alice", "13800000000", FieldMap::new());
        assert!(outcome.success);

        let sent = transport.last_request();
        assert_eq!(sent[0], ("partner_code".to_string(), "partner-1".to_string()));
        assert_eq!(sent[1], ("secret_key".to_string(), "s3cret".to_string()));
        assert_eq!(value(&sent, "event_id"), Some("register_professional_web"));
        assert_eq!(value(&sent, "ip_address"), Some("203.0.113.7"));
        assert_eq!(value(&sent, "account_login"), Some("alice"));
        assert_eq!(value(&sent, "account_mobile"), Some("13800000000"));
        assert_eq!(
            transport.last_url(),
            "https://api.fraudmetrix.cn/riskService"
        );
    }

    #[test]
    fn test_options_override_base_fields() {
        let (client, transport) = client_with(Some(r#"{"success": true}"#));
        let options = FieldMap::new()
            .with("account_mobile", "13999999999")
            .with("state", 1)
            .with("ip_address", "198.51.100.1");
        client.check_marketing("alice", "13800000000", options);

        let sent = transport.last_request();
        assert_eq!(value(&sent, "account_mobile"), Some("13999999999"));
        assert_eq!(value(&sent, "state"), Some("1"));
        assert_eq!(value(&sent, "ip_address"), Some("198.51.100.1"));
        assert_eq!(sent.iter().filter(|(k, _)| k == "account_mobile").count(), 1);
    }

    #[test]
    fn test_credentials_cannot_be_overridden() {
        let (client, transport) = client_with(Some(r#"{"success": true}"#));
        let options = FieldMap::new()
            .with("partner_code", "attacker")
            .with("secret_key", "guess");
        client.check_login("alice", options);

        let sent = transport.last_request();
        assert_eq!(value(&sent, "partner_code"), Some("partner-1"));
        assert_eq!(value(&sent, "secret_key"), Some("s3cret"));
        assert_eq!(sent.iter().filter(|(k, _)| k == "secret_key").count(), 1);
    }

    #[test]
    fn test_event_id_cannot_be_overridden() {
        let (client, transport) = client_with(Some(r#"{"success": true}"#));
        client.check_sms(
            "13800000000",
            FieldMap::new().with("event_id", "login_professional_web"),
        );
        assert_eq!(
            value(&transport.last_request(), "event_id"),
            Some("sms_professional_web")
        );
    }

    #[test]
    fn test_loan_has_no_ip_by_default() {
        let (client, transport) = client_with(Some(r#"{"success": true}"#));
        client.check_loan(
            "Alice",
            "110101199001011234",
            "a@example.com",
            "13800000000",
            FieldMap::new(),
        );

        let sent = transport.last_request();
        assert_eq!(value(&sent, "event_id"), Some("loan_professional_web"));
        assert!(value(&sent, "ip_address").is_none());
        assert_eq!(value(&sent, "account_email"), Some("a@example.com"));
    }

    #[test]
    fn test_loan_ip_switch_uses_caller_ip() {
        let (client, transport) = client_with(Some(r#"{"success": true}"#));
        let loan = |options: FieldMap| {
            client.check_loan("Alice", "1101011990", "a@example.com", "13800000000", options);
            value(&transport.last_request(), "ip_address").map(str::to_string)
        };

        let sent_ip = loan(FieldMap::new().with("ip_address", true));
        assert_eq!(sent_ip.as_deref(), Some("203.0.113.7"));

        let sent_ip = loan(FieldMap::new().with("ip_address", "1.1.1.1"));
        assert_eq!(sent_ip.as_deref(), Some("203.0.113.7"));

        assert!(loan(FieldMap::new().with("ip_address", 0)).is_none());
    }

    #[test]
    fn test_trade_items_are_flattened() {
        let (client, transport) = client_with(Some(r#"{"success": true}"#));
        client.check_trade(
            "buyer",
            "13800000000",
            20.0,
            "CNY",
            2,
            vec![
                FieldMap::new().with("item_id", "a").with("item_price", 5.5),
                FieldMap::new().with("item_id", "b").with("item_price", 14.5),
            ],
            "seller",
            "Seller Ltd",
            "110101199001011234",
            "13900000000",
            "13700000000",
            "1 Main St",
            "Xihu",
            "Hangzhou",
            "Zhejiang",
            FieldMap::new(),
        );

        let sent = transport.last_request();
        assert_eq!(value(&sent, "items[0][item_id]"), Some("a"));
        assert_eq!(value(&sent, "items[1][item_price]"), Some("14.5"));
        assert_eq!(value(&sent, "items_count"), Some("2"));
        assert_eq!(value(&sent, "pay_amount"), Some("20"));
        assert_eq!(value(&sent, "deliver_address_province"), Some("Zhejiang"));
        assert_eq!(value(&sent, "payee_name"), Some("Seller Ltd"));
    }

    #[test]
    fn test_no_response_is_service_unavailable() {
        let (client, _) = client_with(None);
        let outcome =
            client.check_payment("alice", "13800000000", "card", 9.99, "CNY", FieldMap::new());
        assert!(!outcome.success);
        assert_eq!(outcome.error_code(), Some("503"));
        assert_eq!(outcome.error_message(), Some("service unavailable"));
    }

    #[test]
    fn test_business_rejection() {
        let (client, _) = client_with(Some(
            r#"{"success": false, "reason_code": "40001:invalid account"}"#,
        ));
        let outcome = client.check_binding(
            "alice",
            "Alice",
            "110101199001011234",
            "6222000000000000",
            "13800000000",
            FieldMap::new(),
        );
        assert!(!outcome.success);
        assert_eq!(outcome.error_code(), Some("40001"));
        assert_eq!(outcome.error_message(), Some("invalid account"));
    }

    #[test]
    fn test_malformed_rejection_does_not_panic() {
        let (client, _) = client_with(Some(r#"{"success": false, "reason_code": "malformed"}"#));
        let outcome =
            client.check_modify("alice", "13800000000", "6222000000000000", FieldMap::new());
        assert!(!outcome.success);
        assert_eq!(outcome.error_code(), Some(PARSE_ERROR_CODE));
    }

    #[test]
    fn test_last_outcome_is_overwritten() {
        let (client, _) = client_with(Some(r#"{"success": true}"#));
        assert!(client.last_outcome().is_none());

        client.check_login("alice", FieldMap::new());
        let last = client.last_outcome().unwrap();
        assert!(last.success);
        assert!(last.error_code().is_none());
    }

    #[test]
    fn test_plaintext_remote_endpoint_is_refused() {
        let transport = RecordingTransport::new(Some(r#"{"success": true}"#));
        let result = DecisionClient::with_transport(
            ClientConfig::new("p", "s").endpoint_override("http://risk.example.com/riskService"),
            transport.clone(),
            StaticIp("127.0.0.1".to_string()),
        );

        assert!(matches!(result, Err(ClientError::InvalidEndpoint(_))));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dev_mode_endpoint() {
        let transport = RecordingTransport::new(Some(r#"{"success": true}"#));
        let client = DecisionClient::with_transport(
            ClientConfig::new("p", "s").dev_mode(true),
            transport.clone(),
            StaticIp("127.0.0.1".to_string()),
        )
        .unwrap();

        assert_eq!(client.endpoint(), "https://apitest.fraudmetrix.cn/riskService");
        client.check_sms("13800000000", FieldMap::new());
        assert_eq!(transport.last_url(), "https://apitest.fraudmetrix.cn/riskService");
    }
}
