//! Input validation for the transfer form.
//!
//! Validation is a pure function of the current field values and the
//! current token balance lookup. The controller decides when to re-run it.

use serde::Serialize;

use crate::error::ValidationError;
use crate::models::{DecimalAmount, Field, FormFields, TokenStatus, is_valid_address};

/// Per-field validation result. `None` means the field is valid (or empty).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationState {
    pub token_address: Option<ValidationError>,
    pub recipient: Option<ValidationError>,
    pub amount: Option<ValidationError>,
}

impl ValidationState {
    /// Validate every field.
    pub fn compute(form: &FormFields, token: &TokenStatus) -> Self {
        let mut state = Self::default();
        state.revalidate(&Field::ALL, form, token);
        state
    }

    /// Re-validate only `fields`, leaving the others as they are.
    pub fn revalidate(&mut self, fields: &[Field], form: &FormFields, token: &TokenStatus) {
        for field in fields {
            let result = validate_field(*field, form, token);
            match field {
                Field::TokenAddress => self.token_address = result,
                Field::Recipient => self.recipient = result,
                Field::Amount => self.amount = result,
            }
        }
    }

    pub fn get(&self, field: Field) -> Option<ValidationError> {
        match field {
            Field::TokenAddress => self.token_address,
            Field::Recipient => self.recipient,
            Field::Amount => self.amount,
        }
    }

    /// No field holds an error.
    pub fn is_clean(&self) -> bool {
        Field::ALL.iter().all(|f| self.get(*f).is_none())
    }

    /// `(field, message)` for every field in error.
    pub fn errors(&self) -> Vec<(Field, String)> {
        Field::ALL
            .iter()
            .filter_map(|f| self.get(*f).map(|e| (*f, e.to_string())))
            .collect()
    }
}

/// Fields whose validity depends on a change to `field`.
///
/// The token address drives the balance lookup, so the amount check
/// follows it.
pub fn dependents(field: Field) -> &'static [Field] {
    match field {
        Field::TokenAddress => &[Field::TokenAddress, Field::Amount],
        Field::Recipient => &[Field::Recipient],
        Field::Amount => &[Field::Amount],
    }
}

/// The form may be submitted for simulation: every field filled and valid.
pub fn is_submittable(form: &FormFields, validation: &ValidationState) -> bool {
    form.is_complete() && validation.is_clean()
}

/// Validate a single field.
pub fn validate_field(
    field: Field,
    form: &FormFields,
    token: &TokenStatus,
) -> Option<ValidationError> {
    match field {
        Field::TokenAddress => validate_token_address(&form.token_address, token),
        Field::Recipient => validate_recipient(&form.recipient),
        Field::Amount => validate_amount(&form.amount, token),
    }
}

fn validate_token_address(value: &str, token: &TokenStatus) -> Option<ValidationError> {
    if value.is_empty() {
        return None;
    }
    if !is_valid_address(value) {
        return Some(ValidationError::InvalidContractAddress);
    }
    match token {
        TokenStatus::Failed { .. } => Some(ValidationError::TokenUnavailable),
        _ => None,
    }
}

fn validate_recipient(value: &str) -> Option<ValidationError> {
    if value.is_empty() || is_valid_address(value) {
        None
    } else {
        Some(ValidationError::InvalidWalletAddress)
    }
}

/// Precision and balance checks only run against loaded token metadata;
/// while the lookup is pending the amount is not judged against a stale value.
fn validate_amount(value: &str, token: &TokenStatus) -> Option<ValidationError> {
    if value.is_empty() {
        return None;
    }
    let Ok(amount) = DecimalAmount::parse(value) else {
        return Some(ValidationError::NotANumber);
    };
    if !amount.is_positive() {
        return Some(ValidationError::NotPositive);
    }
    let balance = token.balance()?;
    if !amount.fits_decimals(balance.decimals) {
        return Some(ValidationError::TooPrecise);
    }
    if amount > balance.amount() {
        return Some(ValidationError::InsufficientBalance);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenBalance;

    const TOKEN: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const RECIPIENT: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn token(balance: &str, decimals: u8) -> TokenStatus {
        TokenStatus::Loaded(TokenBalance {
            value: crate::models::parse_units(balance, decimals).unwrap(),
            decimals,
            symbol: "ZEN".into(),
            name: None,
        })
    }

    fn zen(balance: &str) -> TokenStatus {
        token(balance, 18)
    }

    fn form(token: &str, recipient: &str, amount: &str) -> FormFields {
        FormFields {
            token_address: token.into(),
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }

    #[test]
    fn empty_fields_carry_no_error() {
        let state = ValidationState::compute(&FormFields::default(), &TokenStatus::Unset);
        assert!(state.is_clean());
        assert!(!is_submittable(&FormFields::default(), &state));
    }

    #[test]
    fn malformed_addresses() {
        let state = ValidationState::compute(&form("0x123", "bob", ""), &TokenStatus::Unset);
        assert_eq!(state.token_address, Some(ValidationError::InvalidContractAddress));
        assert_eq!(state.recipient, Some(ValidationError::InvalidWalletAddress));
        assert_eq!(state.amount, None);
    }

    // Test critique: tout montant <= 0 ou non numérique est refusé
    #[test]
    fn non_positive_and_non_numeric_amounts() {
        for (amount, expected) in [
            ("abc", ValidationError::NotANumber),
            ("1e3", ValidationError::NotANumber),
            ("0", ValidationError::NotPositive),
            ("0.000", ValidationError::NotPositive),
            ("-4", ValidationError::NotPositive),
        ] {
            let f = form(TOKEN, RECIPIENT, amount);
            let state = ValidationState::compute(&f, &zen("5"));
            assert_eq!(state.amount, Some(expected), "amount {amount:?}");
            assert!(!is_submittable(&f, &state));
        }
    }

    #[test]
    fn amount_above_balance_is_insufficient() {
        let state = ValidationState::compute(&form(TOKEN, RECIPIENT, "10"), &zen("5"));
        assert_eq!(state.amount, Some(ValidationError::InsufficientBalance));

        let state = ValidationState::compute(&form(TOKEN, RECIPIENT, "5.000000000000000001"), &zen("5"));
        assert_eq!(state.amount, Some(ValidationError::InsufficientBalance));

        let f = form(TOKEN, RECIPIENT, "5");
        let state = ValidationState::compute(&f, &zen("5"));
        assert!(state.is_clean());
        assert!(is_submittable(&f, &state));
    }

    #[test]
    fn amount_finer_than_token_decimals_is_too_precise() {
        let f = form(TOKEN, RECIPIENT, "0.0000001");
        let state = ValidationState::compute(&f, &token("5", 6));
        assert_eq!(state.amount, Some(ValidationError::TooPrecise));
        assert_eq!(
            state.errors(),
            vec![(Field::Amount, "too many decimal places".to_string())]
        );
        assert!(!is_submittable(&f, &state));

        let state = ValidationState::compute(&form(TOKEN, RECIPIENT, "0.000001"), &token("5", 6));
        assert!(state.is_clean());

        // Decimals unknown: not judged yet
        let state = ValidationState::compute(&f, &TokenStatus::Loading);
        assert_eq!(state.amount, None);
    }

    #[test]
    fn balance_not_judged_while_loading() {
        let state = ValidationState::compute(&form(TOKEN, RECIPIENT, "10"), &TokenStatus::Loading);
        assert_eq!(state.amount, None);
    }

    #[test]
    fn failed_lookup_flags_token_field() {
        let failed = TokenStatus::Failed {
            reason: "execution reverted".into(),
        };
        let state = ValidationState::compute(&form(TOKEN, RECIPIENT, "1"), &failed);
        assert_eq!(state.token_address, Some(ValidationError::TokenUnavailable));
        assert_eq!(
            state.errors(),
            vec![(Field::TokenAddress, "unable to load token info".to_string())]
        );
    }

    #[test]
    fn revalidate_touches_only_dependents() {
        let mut f = form(TOKEN, "nope", "10");
        let mut state = ValidationState::compute(&f, &zen("5"));
        assert_eq!(state.recipient, Some(ValidationError::InvalidWalletAddress));

        // The amount changes; the recipient error is left as computed.
        f.amount = "1".into();
        state.revalidate(dependents(Field::Amount), &f, &zen("5"));
        assert_eq!(state.amount, None);
        assert_eq!(state.recipient, Some(ValidationError::InvalidWalletAddress));
    }
}
