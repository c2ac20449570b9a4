use crate::errors::LookupError;

/// Fault code the service raises when a customer has no subscriptions.
pub const NO_SUBSCRIPTIONS_FOUND: &str = "WEB-NO-SUBSCRIPTIONS-FOUND";

/// Which contract states the service includes in a result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FilterLogic {
    /// Leave closed contracts out of the result.
    #[default]
    NoClosedContracts,
    /// Any other value understood by the service, passed through verbatim.
    Other(String),
}

impl FilterLogic {
    pub fn as_str(&self) -> &str {
        match self {
            FilterLogic::NoClosedContracts => "NO_CLOSED_CONTRACTS",
            FilterLogic::Other(value) => value,
        }
    }
}

impl From<&str> for FilterLogic {
    fn from(value: &str) -> Self {
        if value == "NO_CLOSED_CONTRACTS" {
            FilterLogic::NoClosedContracts
        } else {
            FilterLogic::Other(value.to_string())
        }
    }
}

/// A single `readCustomerSubscriptions` query.
///
/// The two variants carry disjoint key fields: an email lookup never sends a
/// customer number and vice versa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupRequest {
    ByEmail {
        email: String,
        zip_code: String,
        filter_logic: FilterLogic,
    },
    ByCustomerNumber {
        customer_number: String,
        filter_logic: FilterLogic,
    },
}

impl LookupRequest {
    /// Builds an email + zip code query, rejecting blank keys.
    pub fn by_email(
        email: &str,
        zip_code: &str,
        filter_logic: Option<FilterLogic>,
    ) -> Result<Self, LookupError> {
        Ok(LookupRequest::ByEmail {
            email: non_empty("email", email)?,
            zip_code: non_empty("zip code", zip_code)?,
            filter_logic: filter_logic.unwrap_or_default(),
        })
    }

    /// Builds a customer number query, rejecting a blank number.
    pub fn by_customer_number(
        customer_number: &str,
        filter_logic: Option<FilterLogic>,
    ) -> Result<Self, LookupError> {
        Ok(LookupRequest::ByCustomerNumber {
            customer_number: non_empty("customer number", customer_number)?,
            filter_logic: filter_logic.unwrap_or_default(),
        })
    }

    pub fn filter_logic(&self) -> &FilterLogic {
        match self {
            LookupRequest::ByEmail { filter_logic, .. } => filter_logic,
            LookupRequest::ByCustomerNumber { filter_logic, .. } => filter_logic,
        }
    }

    /// Wire fields identifying the customer, in send order.
    pub fn key_fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            LookupRequest::ByEmail {
                email, zip_code, ..
            } => vec![("zipCode", zip_code.as_str()), ("eMail", email.as_str())],
            LookupRequest::ByCustomerNumber {
                customer_number, ..
            } => vec![("customerIdStr", customer_number.as_str())],
        }
    }

    /// Short description for log lines. Does not include the email address.
    pub fn describe(&self) -> String {
        match self {
            LookupRequest::ByEmail { zip_code, .. } => format!("email/zip {}", zip_code),
            LookupRequest::ByCustomerNumber {
                customer_number, ..
            } => format!("customer {}", customer_number),
        }
    }
}

fn non_empty(field: &str, value: &str) -> Result<String, LookupError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LookupError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// One leaf value inside a subscription record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionField {
    /// Slash-separated element path relative to the record, e.g. `product/shortName`.
    pub path: String,
    pub value: String,
}

/// A `customerSubscriptions` element exactly as the service returned it.
///
/// The adapter does not interpret records. The raw fragment is kept alongside
/// a flattened view of its leaf values for callers that want to peek inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub raw_xml: String,
    pub fields: Vec<SubscriptionField>,
}

impl SubscriptionRecord {
    /// First value stored under `path`.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.value.as_str())
    }
}

/// Outcome of a lookup that reached the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    /// The service returned a (possibly empty) list of subscriptions.
    Found(Vec<SubscriptionRecord>),
    /// The service reported that no subscriptions exist for the customer.
    NotFound,
}

impl LookupResult {
    /// Number of subscriptions; zero for `NotFound`.
    pub fn count(&self) -> usize {
        match self {
            LookupResult::Found(records) => records.len(),
            LookupResult::NotFound => 0,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupResult::NotFound)
    }

    pub fn subscriptions(&self) -> Option<&[SubscriptionRecord]> {
        match self {
            LookupResult::Found(records) => Some(records),
            LookupResult::NotFound => None,
        }
    }
}
