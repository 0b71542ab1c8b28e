//! Invoice payloads carried through the payment provider.
//!
//! The payload is the only thing the provider echoes back on a successful
//! payment, so it must route the confirmation on its own. Catalog segments
//! reject `_`, which keeps the delimiter unambiguous for the bulk form.

use crate::{EngineError, ResultEngine};

/// Currency code for Telegram Stars invoices.
pub const STARS_CURRENCY: &str = "XTR";

/// What a confirmed payment should do once the provider reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentPayload {
    /// `topup_<amount>`: credit stars to the payer.
    TopUp { amount: i64 },
    /// `single_paper_<id>`: grant one paper, no balance change.
    Paper { paper_id: i64 },
    /// `bulk_purchase_<dept>_<sem>_<year>`: grant every paper at the tuple.
    Bulk {
        department: String,
        semester: String,
        year: String,
    },
}

impl PaymentPayload {
    pub fn encode(&self) -> String {
        match self {
            Self::TopUp { amount } => format!("topup_{amount}"),
            Self::Paper { paper_id } => format!("single_paper_{paper_id}"),
            Self::Bulk {
                department,
                semester,
                year,
            } => format!("bulk_purchase_{department}_{semester}_{year}"),
        }
    }

    pub fn decode(raw: &str) -> ResultEngine<Self> {
        if let Some(rest) = raw.strip_prefix("topup_") {
            let amount = parse_number(raw, rest)?;
            return Ok(Self::TopUp { amount });
        }
        if let Some(rest) = raw.strip_prefix("single_paper_") {
            let paper_id = parse_number(raw, rest)?;
            return Ok(Self::Paper { paper_id });
        }
        if let Some(rest) = raw.strip_prefix("bulk_purchase_") {
            let mut segments = rest.split('_');
            let (Some(department), Some(semester), Some(year), None) = (
                segments.next(),
                segments.next(),
                segments.next(),
                segments.next(),
            ) else {
                return Err(EngineError::MalformedPayload(raw.to_string()));
            };
            if department.is_empty() || semester.is_empty() || year.is_empty() {
                return Err(EngineError::MalformedPayload(raw.to_string()));
            }
            return Ok(Self::Bulk {
                department: department.to_string(),
                semester: semester.to_string(),
                year: year.to_string(),
            });
        }

        Err(EngineError::MalformedPayload(raw.to_string()))
    }
}

fn parse_number(raw: &str, digits: &str) -> ResultEngine<i64> {
    digits
        .parse::<i64>()
        .ok()
        .filter(|n| *n >= 0)
        .ok_or_else(|| EngineError::MalformedPayload(raw.to_string()))
}

/// Everything the payment provider needs to issue an invoice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvoiceRequest {
    pub title: String,
    pub description: String,
    pub payload: String,
    /// Stars to charge. Always positive.
    pub amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topup_round_trip() {
        let payload = PaymentPayload::TopUp { amount: 100 };
        assert_eq!(payload.encode(), "topup_100");
        assert_eq!(PaymentPayload::decode("topup_100").unwrap(), payload);
    }

    #[test]
    fn single_paper_round_trip() {
        let payload = PaymentPayload::Paper { paper_id: 42 };
        assert_eq!(payload.encode(), "single_paper_42");
        assert_eq!(PaymentPayload::decode("single_paper_42").unwrap(), payload);
    }

    #[test]
    fn bulk_round_trip() {
        let payload = PaymentPayload::Bulk {
            department: "CSE".to_string(),
            semester: "Sem3".to_string(),
            year: "2023".to_string(),
        };
        assert_eq!(payload.encode(), "bulk_purchase_CSE_Sem3_2023");
        assert_eq!(
            PaymentPayload::decode("bulk_purchase_CSE_Sem3_2023").unwrap(),
            payload
        );
    }

    #[test]
    fn rejects_unknown_prefix() {
        assert_eq!(
            PaymentPayload::decode("buy_star_100").unwrap_err(),
            EngineError::MalformedPayload("buy_star_100".to_string())
        );
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(PaymentPayload::decode("topup_").is_err());
        assert!(PaymentPayload::decode("topup_-5").is_err());
        assert!(PaymentPayload::decode("single_paper_abc").is_err());
    }

    #[test]
    fn rejects_bulk_with_wrong_arity() {
        assert!(PaymentPayload::decode("bulk_purchase_CSE_Sem3").is_err());
        assert!(PaymentPayload::decode("bulk_purchase_CSE_Sem3_2023_extra").is_err());
        assert!(PaymentPayload::decode("bulk_purchase__Sem3_2023").is_err());
    }
}
