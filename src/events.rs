//! Risk event definitions.
//!
//! Each event type has a fixed `event_id` and a set of required fields that
//! always appear in the request. Typed optional fields are included only
//! when set. Builders do not validate field contents.

use crate::errors::ClientError;
use crate::fields::{FieldMap, FieldValue};
use std::fmt;
use std::str::FromStr;

/// How the caller IP is attached to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpPolicy {
    /// `ip_address` is always a base field.
    Always,
    /// `ip_address` is sent only when the options carry a truthy
    /// `ip_address`, and the value sent is the resolved caller IP.
    OnRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Register,
    Login,
    Sms,
    Loan,
    Marketing,
    Trade,
    Payment,
    Binding,
    Modify,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::Register,
        EventKind::Login,
        EventKind::Sms,
        EventKind::Loan,
        EventKind::Marketing,
        EventKind::Trade,
        EventKind::Payment,
        EventKind::Binding,
        EventKind::Modify,
    ];

    pub fn event_id(self) -> &'static str {
        match self {
            EventKind::Register => "register_professional_web",
            EventKind::Login => "login_professional_web",
            EventKind::Sms => "sms_professional_web",
            EventKind::Loan => "loan_professional_web",
            EventKind::Marketing => "marketing_professional_web",
            EventKind::Trade => "trade_professional_web",
            EventKind::Payment => "payment_professional_web",
            EventKind::Binding => "binding_professional_web",
            EventKind::Modify => "modify_professional_web",
        }
    }

    /// Fields that are always present in the request, beyond `ip_address`.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            EventKind::Register => &["account_login", "account_mobile"],
            EventKind::Login => &["account_login"],
            EventKind::Sms => &["account_mobile"],
            EventKind::Loan => &["account_name", "id_number", "account_email", "account_mobile"],
            EventKind::Marketing => &["account_login", "account_mobile"],
            EventKind::Trade => &[
                "account_login",
                "account_mobile",
                "pay_amount",
                "pay_currency",
                "items_count",
                "items",
                "payee_userid",
                "payee_name",
                "payee_id_number",
                "payee_mobile",
                "deliver_mobile",
                "deliver_address_street",
                "deliver_address_county",
                "deliver_address_city",
                "deliver_address_province",
            ],
            EventKind::Payment => &[
                "account_login",
                "account_mobile",
                "pay_method",
                "pay_amount",
                "pay_currency",
            ],
            EventKind::Binding => &[
                "account_login",
                "account_name",
                "id_number",
                "card_number",
                "card_binding_mobile",
            ],
            EventKind::Modify => &["account_login", "account_mobile", "card_number"],
        }
    }

    pub fn ip_policy(self) -> IpPolicy {
        match self {
            EventKind::Loan => IpPolicy::OnRequest,
            _ => IpPolicy::Always,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EventKind::Register => "register",
            EventKind::Login => "login",
            EventKind::Sms => "sms",
            EventKind::Loan => "loan",
            EventKind::Marketing => "marketing",
            EventKind::Trade => "trade",
            EventKind::Payment => "payment",
            EventKind::Binding => "binding",
            EventKind::Modify => "modify",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s || kind.event_id() == s)
            .ok_or_else(|| ClientError::InvalidField(format!("unknown event type '{}'", s)))
    }
}

/// An event that can be submitted for a risk decision.
pub trait RiskEvent {
    fn kind(&self) -> EventKind;

    /// Event-specific fields, excluding `event_id` and `ip_address`.
    fn base_fields(&self) -> FieldMap;
}

/// Account registration.
#[derive(Debug, Clone)]
pub struct RegisterEvent {
    pub account_login: String,
    pub account_mobile: String,
    pub account_email: Option<String>,
    pub id_number: Option<String>,
    /// Password digest; hash before submitting.
    pub account_password: Option<String>,
    /// Invitation code.
    pub rem_code: Option<String>,
    pub state: Option<i64>,
}

impl RegisterEvent {
    pub fn new(account_login: impl Into<String>, account_mobile: impl Into<String>) -> Self {
        Self {
            account_login: account_login.into(),
            account_mobile: account_mobile.into(),
            account_email: None,
            id_number: None,
            account_password: None,
            rem_code: None,
            state: None,
        }
    }

    pub fn account_email(mut self, email: impl Into<String>) -> Self {
        self.account_email = Some(email.into());
        self
    }

    pub fn id_number(mut self, id_number: impl Into<String>) -> Self {
        self.id_number = Some(id_number.into());
        self
    }

    pub fn account_password(mut self, digest: impl Into<String>) -> Self {
        self.account_password = Some(digest.into());
        self
    }

    pub fn rem_code(mut self, rem_code: impl Into<String>) -> Self {
        self.rem_code = Some(rem_code.into());
        self
    }

    pub fn state(mut self, state: i64) -> Self {
        self.state = Some(state);
        self
    }
}

impl RiskEvent for RegisterEvent {
    fn kind(&self) -> EventKind {
        EventKind::Register
    }

    fn base_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new()
            .with("account_login", &self.account_login)
            .with("account_mobile", &self.account_mobile);
        fields.insert_opt("account_email", self.account_email.as_ref());
        fields.insert_opt("id_number", self.id_number.as_ref());
        fields.insert_opt("account_password", self.account_password.as_ref());
        fields.insert_opt("rem_code", self.rem_code.as_ref());
        fields.insert_opt("state", self.state);
        fields
    }
}

/// Account login.
#[derive(Debug, Clone)]
pub struct LoginEvent {
    pub account_login: String,
    /// Password check result: 0 correct, 1 wrong.
    pub state: Option<i64>,
    pub account_password: Option<String>,
}

impl LoginEvent {
    pub fn new(account_login: impl Into<String>) -> Self {
        Self {
            account_login: account_login.into(),
            state: None,
            account_password: None,
        }
    }

    pub fn state(mut self, state: i64) -> Self {
        self.state = Some(state);
        self
    }

    pub fn account_password(mut self, digest: impl Into<String>) -> Self {
        self.account_password = Some(digest.into());
        self
    }
}

impl RiskEvent for LoginEvent {
    fn kind(&self) -> EventKind {
        EventKind::Login
    }

    fn base_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new().with("account_login", &self.account_login);
        fields.insert_opt("state", self.state);
        fields.insert_opt("account_password", self.account_password.as_ref());
        fields
    }
}

/// Verification SMS request.
#[derive(Debug, Clone)]
pub struct SmsEvent {
    pub account_mobile: String,
    pub sms_content: Option<String>,
    pub state: Option<i64>,
}

impl SmsEvent {
    pub fn new(account_mobile: impl Into<String>) -> Self {
        Self {
            account_mobile: account_mobile.into(),
            sms_content: None,
            state: None,
        }
    }

    pub fn sms_content(mut self, content: impl Into<String>) -> Self {
        self.sms_content = Some(content.into());
        self
    }

    pub fn state(mut self, state: i64) -> Self {
        self.state = Some(state);
        self
    }
}

impl RiskEvent for SmsEvent {
    fn kind(&self) -> EventKind {
        EventKind::Sms
    }

    fn base_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new().with("account_mobile", &self.account_mobile);
        fields.insert_opt("sms_content", self.sms_content.as_ref());
        fields.insert_opt("state", self.state);
        fields
    }
}

/// Loan application. Carries no `ip_address` unless the options ask for it.
#[derive(Debug, Clone)]
pub struct LoanEvent {
    pub account_name: String,
    pub id_number: String,
    pub account_email: String,
    pub account_mobile: String,
}

impl LoanEvent {
    pub fn new(
        account_name: impl Into<String>,
        id_number: impl Into<String>,
        account_email: impl Into<String>,
        account_mobile: impl Into<String>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            id_number: id_number.into(),
            account_email: account_email.into(),
            account_mobile: account_mobile.into(),
        }
    }
}

impl RiskEvent for LoanEvent {
    fn kind(&self) -> EventKind {
        EventKind::Loan
    }

    fn base_fields(&self) -> FieldMap {
        FieldMap::new()
            .with("account_name", &self.account_name)
            .with("id_number", &self.id_number)
            .with("account_email", &self.account_email)
            .with("account_mobile", &self.account_mobile)
    }
}

/// Marketing campaign participation.
#[derive(Debug, Clone)]
pub struct MarketingEvent {
    pub account_login: String,
    pub account_mobile: String,
}

impl MarketingEvent {
    pub fn new(account_login: impl Into<String>, account_mobile: impl Into<String>) -> Self {
        Self {
            account_login: account_login.into(),
            account_mobile: account_mobile.into(),
        }
    }
}

impl RiskEvent for MarketingEvent {
    fn kind(&self) -> EventKind {
        EventKind::Marketing
    }

    fn base_fields(&self) -> FieldMap {
        FieldMap::new()
            .with("account_login", &self.account_login)
            .with("account_mobile", &self.account_mobile)
    }
}

/// Order placement, with payee and delivery details.
#[derive(Debug, Clone)]
pub struct TradeEvent {
    pub account_login: String,
    pub account_mobile: String,
    pub pay_amount: f64,
    pub pay_currency: String,
    pub items_count: i64,
    /// One map per line item.
    pub items: Vec<FieldMap>,
    pub payee_userid: String,
    pub payee_name: String,
    pub payee_id_number: String,
    pub payee_mobile: String,
    pub deliver_mobile: String,
    pub deliver_address_street: String,
    pub deliver_address_county: String,
    pub deliver_address_city: String,
    pub deliver_address_province: String,
}

impl TradeEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account_login: impl Into<String>,
        account_mobile: impl Into<String>,
        pay_amount: f64,
        pay_currency: impl Into<String>,
        items_count: i64,
        items: Vec<FieldMap>,
        payee_userid: impl Into<String>,
        payee_name: impl Into<String>,
        payee_id_number: impl Into<String>,
        payee_mobile: impl Into<String>,
        deliver_mobile: impl Into<String>,
        deliver_address_street: impl Into<String>,
        deliver_address_county: impl Into<String>,
        deliver_address_city: impl Into<String>,
        deliver_address_province: impl Into<String>,
    ) -> Self {
        Self {
            account_login: account_login.into(),
            account_mobile: account_mobile.into(),
            pay_amount,
            pay_currency: pay_currency.into(),
            items_count,
            items,
            payee_userid: payee_userid.into(),
            payee_name: payee_name.into(),
            payee_id_number: payee_id_number.into(),
            payee_mobile: payee_mobile.into(),
            deliver_mobile: deliver_mobile.into(),
            deliver_address_street: deliver_address_street.into(),
            deliver_address_county: deliver_address_county.into(),
            deliver_address_city: deliver_address_city.into(),
            deliver_address_province: deliver_address_province.into(),
        }
    }
}

impl RiskEvent for TradeEvent {
    fn kind(&self) -> EventKind {
        EventKind::Trade
    }

    fn base_fields(&self) -> FieldMap {
        FieldMap::new()
            .with("account_login", &self.account_login)
            .with("account_mobile", &self.account_mobile)
            .with("pay_amount", self.pay_amount)
            .with("pay_currency", &self.pay_currency)
            .with("items_count", self.items_count)
            .with("items", self.items.clone())
            .with("payee_userid", &self.payee_userid)
            .with("payee_name", &self.payee_name)
            .with("payee_id_number", &self.payee_id_number)
            .with("payee_mobile", &self.payee_mobile)
            .with("deliver_mobile", &self.deliver_mobile)
            .with("deliver_address_street", &self.deliver_address_street)
            .with("deliver_address_county", &self.deliver_address_county)
            .with("deliver_address_city", &self.deliver_address_city)
            .with("deliver_address_province", &self.deliver_address_province)
    }
}

/// Payment.
#[derive(Debug, Clone)]
pub struct PaymentEvent {
    pub account_login: String,
    pub account_mobile: String,
    pub pay_method: String,
    pub pay_amount: f64,
    pub pay_currency: String,
}

impl PaymentEvent {
    pub fn new(
        account_login: impl Into<String>,
        account_mobile: impl Into<String>,
        pay_method: impl Into<String>,
        pay_amount: f64,
        pay_currency: impl Into<String>,
    ) -> Self {
        Self {
            account_login: account_login.into(),
            account_mobile: account_mobile.into(),
            pay_method: pay_method.into(),
            pay_amount,
            pay_currency: pay_currency.into(),
        }
    }
}

impl RiskEvent for PaymentEvent {
    fn kind(&self) -> EventKind {
        EventKind::Payment
    }

    fn base_fields(&self) -> FieldMap {
        FieldMap::new()
            .with("account_login", &self.account_login)
            .with("account_mobile", &self.account_mobile)
            .with("pay_method", &self.pay_method)
            .with("pay_amount", self.pay_amount)
            .with("pay_currency", &self.pay_currency)
    }
}

/// Bank card binding.
#[derive(Debug, Clone)]
pub struct BindingEvent {
    pub account_login: String,
    pub account_name: String,
    pub id_number: String,
    pub card_number: String,
    pub card_binding_mobile: String,
}

impl BindingEvent {
    pub fn new(
        account_login: impl Into<String>,
        account_name: impl Into<String>,
        id_number: impl Into<String>,
        card_number: impl Into<String>,
        card_binding_mobile: impl Into<String>,
    ) -> Self {
        Self {
            account_login: account_login.into(),
            account_name: account_name.into(),
            id_number: id_number.into(),
            card_number: card_number.into(),
            card_binding_mobile: card_binding_mobile.into(),
        }
    }
}

impl RiskEvent for BindingEvent {
    fn kind(&self) -> EventKind {
        EventKind::Binding
    }

    fn base_fields(&self) -> FieldMap {
        FieldMap::new()
            .with("account_login", &self.account_login)
            .with("account_name", &self.account_name)
            .with("id_number", &self.id_number)
            .with("card_number", &self.card_number)
            .with("card_binding_mobile", &self.card_binding_mobile)
    }
}

/// Profile modification.
#[derive(Debug, Clone)]
pub struct ModifyEvent {
    pub account_login: String,
    pub account_mobile: String,
    pub card_number: String,
}

impl ModifyEvent {
    pub fn new(
        account_login: impl Into<String>,
        account_mobile: impl Into<String>,
        card_number: impl Into<String>,
    ) -> Self {
        Self {
            account_login: account_login.into(),
            account_mobile: account_mobile.into(),
            card_number: card_number.into(),
        }
    }
}

impl RiskEvent for ModifyEvent {
    fn kind(&self) -> EventKind {
        EventKind::Modify
    }

    fn base_fields(&self) -> FieldMap {
        FieldMap::new()
            .with("account_login", &self.account_login)
            .with("account_mobile", &self.account_mobile)
            .with("card_number", &self.card_number)
    }
}

/// An event assembled from an untyped field map, e.g. decoded JSON.
#[derive(Debug, Clone)]
pub struct DynamicEvent {
    kind: EventKind,
    fields: FieldMap,
}

impl DynamicEvent {
    /// Moves the required fields of `kind` out of `fields`.
    ///
    /// Returns the event and the remaining entries, to be sent as options.
    pub fn split(kind: EventKind, mut fields: FieldMap) -> Result<(Self, FieldMap), ClientError> {
        let mut required = FieldMap::new();
        for name in kind.required_fields() {
            let value: FieldValue = fields.remove(name).ok_or_else(|| {
                ClientError::InvalidField(format!(
                    "{} event requires field '{}'",
                    kind, name
                ))
            })?;
            required.insert(*name, value);
        }
        Ok((
            Self {
                kind,
                fields: required,
            },
            fields,
        ))
    }
}

impl RiskEvent for DynamicEvent {
    fn kind(&self) -> EventKind {
        self.kind
    }

    fn base_fields(&self) -> FieldMap {
        self.fields.clone()
    }
}
