//! Corporate-action submission document.
//!
//! Field names are the camelCase names the submission endpoint validates
//! against; they must not drift. The typed model is lenient where the service
//! is: unknown keys are ignored and blank optional inputs read as absent.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "DVCA")]
    CashDividend,
    #[serde(rename = "SPLF")]
    StockSplit,
    #[serde(rename = "MRGR")]
    Merger,
    #[serde(rename = "RHTS")]
    RightsIssue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MandatoryVoluntary {
    #[serde(rename = "MAND")]
    Mandatory,
    #[serde(rename = "VOLU")]
    Voluntary,
    #[serde(rename = "CHOS")]
    MandatoryWithChoice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionType {
    #[serde(rename = "CASH")]
    Cash,
    #[serde(rename = "SECU")]
    Securities,
    #[serde(rename = "LAPS")]
    Lapse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    #[serde(rename = "corporateActionGeneralInformation")]
    pub general_information: GeneralInformation,
    #[serde(rename = "corporateActionDetails")]
    pub details: EventDetails,
    #[serde(rename = "underlyingSecurity")]
    pub underlying_security: UnderlyingSecurity,
    pub options: Vec<OptionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralInformation {
    #[serde(rename = "officialCorporateActionEventID")]
    pub event_id: String,
    #[serde(rename = "eventType")]
    pub event_type: EventType,
    #[serde(rename = "mandatoryVoluntaryEventType")]
    pub mandatory_voluntary: MandatoryVoluntary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    pub dates: KeyDates,
    #[serde(
        rename = "rateAndPrice",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub rate_and_price: Option<RateAndPrice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDates {
    #[serde(rename = "announcementDate")]
    pub announcement_date: String,
    #[serde(rename = "exDate", default, skip_serializing_if = "Option::is_none")]
    pub ex_date: Option<String>,
    #[serde(rename = "recordDate")]
    pub record_date: String,
    #[serde(rename = "paymentDate")]
    pub payment_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateAndPrice {
    #[serde(
        rename = "grossDividendRate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub gross_dividend_rate: Option<Rate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    #[serde(
        default,
        deserialize_with = "amount_from_number_or_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<f64>,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub currency: Option<String>,
}

/// Form inputs post amounts as text; `""` means no amount.
fn amount_from_number_or_text<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    match Option::<Amount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Amount::Number(value)) => Ok(Some(value)),
        Some(Amount::Text(text)) if text.is_empty() => Ok(None),
        Some(Amount::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("amount is not a number: {text:?}"))),
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|value| !value.is_empty()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnderlyingSecurity {
    pub isin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionEntry {
    #[serde(rename = "optionNumber")]
    pub option_number: String,
    #[serde(rename = "optionType")]
    pub option_type: OptionType,
    #[serde(
        rename = "defaultOption",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_option: Option<bool>,
}

impl OptionEntry {
    pub fn is_default(&self) -> bool {
        self.default_option.unwrap_or(false)
    }
}

impl SubmissionPayload {
    /// Cash dividend with a single default cash option, the canonical
    /// scenario submitted when no payload file is configured.
    pub fn sample(event_id: &str) -> Self {
        Self {
            general_information: GeneralInformation {
                event_id: event_id.to_string(),
                event_type: EventType::CashDividend,
                mandatory_voluntary: MandatoryVoluntary::Mandatory,
            },
            details: EventDetails {
                dates: KeyDates {
                    announcement_date: "2023-10-01".to_string(),
                    ex_date: None,
                    record_date: "2023-10-15".to_string(),
                    payment_date: "2023-10-20".to_string(),
                },
                rate_and_price: Some(RateAndPrice {
                    gross_dividend_rate: Some(Rate {
                        amount: Some(0.50),
                        currency: Some("USD".to_string()),
                    }),
                }),
            },
            underlying_security: UnderlyingSecurity {
                isin: "US0000000001".to_string(),
                ticker: Some("TST".to_string()),
            },
            options: vec![OptionEntry {
                option_number: "001".to_string(),
                option_type: OptionType::Cash,
                default_option: Some(true),
            }],
        }
    }

    pub fn event_id(&self) -> &str {
        &self.general_information.event_id
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(self)
            .map_err(|err| format!("failed to serialize submission payload: {err}"))
    }

    /// Checks the document against the rules the receiving service applies.
    /// An empty result means the payload should be accepted. The harness
    /// itself never refuses to submit on these grounds.
    pub fn preflight(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.general_information.event_id.trim().is_empty() {
            issues.push("officialCorporateActionEventID is required".to_string());
        }
        if !is_valid_isin(&self.underlying_security.isin) {
            issues.push(format!(
                "underlyingSecurity.isin has invalid format: {}",
                self.underlying_security.isin
            ));
        }

        let dates = &self.details.dates;
        for (name, value) in [
            ("announcementDate", Some(&dates.announcement_date)),
            ("exDate", dates.ex_date.as_ref()),
            ("recordDate", Some(&dates.record_date)),
            ("paymentDate", Some(&dates.payment_date)),
        ] {
            if let Some(value) = value {
                if !is_valid_date(value) {
                    issues.push(format!("dates.{name} is not a valid date: {value}"));
                }
            }
        }

        if let Some(rate) = self
            .details
            .rate_and_price
            .as_ref()
            .and_then(|r| r.gross_dividend_rate.as_ref())
        {
            if let Some(amount) = rate.amount {
                if !amount.is_finite() || amount <= 0.0 {
                    issues.push(format!("grossDividendRate.amount must be positive: {amount}"));
                }
            }
            if let Some(currency) = rate.currency.as_deref().filter(|c| !c.is_empty()) {
                if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
                    issues.push(format!("grossDividendRate.currency is invalid: {currency}"));
                }
            }
        }

        if self.options.is_empty() {
            issues.push("at least one option is required".to_string());
        }
        for (idx, option) in self.options.iter().enumerate() {
            if option.option_number.trim().is_empty() {
                issues.push(format!("options[{idx}].optionNumber is required"));
            }
        }
        let defaults = self.options.iter().filter(|o| o.is_default()).count();
        if !self.options.is_empty() && defaults != 1 {
            issues.push(format!(
                "exactly one option must be marked default (found {defaults})"
            ));
        }

        issues
    }
}

/// The body actually posted to the service.
///
/// A document loaded from disk is submitted byte for byte as written; the
/// typed view only feeds the preflight checks. A document that does not fit
/// the typed model is still submitted and the mismatch is reported as a
/// preflight issue.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionDocument {
    typed: Result<SubmissionPayload, String>,
    raw: Option<String>,
    event_id: String,
}

impl From<SubmissionPayload> for SubmissionDocument {
    fn from(payload: SubmissionPayload) -> Self {
        Self {
            event_id: payload.event_id().to_string(),
            typed: Ok(payload),
            raw: None,
        }
    }
}

impl SubmissionDocument {
    /// Fails only when `raw` is not JSON at all.
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| format!("submission payload is not valid JSON: {err}"))?;
        let event_id = value
            .pointer("/corporateActionGeneralInformation/officialCorporateActionEventID")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let typed = SubmissionPayload::deserialize(&value)
            .map_err(|err| format!("payload does not match the submission schema: {err}"));
        Ok(Self {
            typed,
            raw: Some(raw.to_string()),
            event_id,
        })
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn to_json(&self) -> Result<String, String> {
        match (&self.raw, &self.typed) {
            (Some(raw), _) => Ok(raw.clone()),
            (None, Ok(payload)) => payload.to_json(),
            (None, Err(err)) => Err(err.clone()),
        }
    }

    pub fn preflight(&self) -> Vec<String> {
        match &self.typed {
            Ok(payload) => payload.preflight(),
            Err(err) => vec![err.clone()],
        }
    }
}

fn is_valid_isin(isin: &str) -> bool {
    let bytes = isin.as_bytes();
    bytes.len() == 12
        && bytes[..2].iter().all(|b| b.is_ascii_uppercase())
        && bytes[2..11]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        && bytes[11].is_ascii_digit()
}

fn is_valid_date(value: &str) -> bool {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(trimmed).is_ok()
}
