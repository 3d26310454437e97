//! Canonical attribute keys for the eligibility matrix.
//!
//! Every program carries a value (possibly empty) for each of these keys, in
//! this order. The order is the matrix row order, which downstream rendering
//! preserves, so additions belong at the end of their category block.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Canonical attribute keys in matrix row order.
pub const ATTRIBUTE_KEYS: [&str; 60] = [
    // Program
    "program_summary",
    // Loan terms
    "loan_amount",
    "loan_type",
    "dti",
    "ltv",
    "cltv",
    "cash_out",
    "reserves",
    "transaction_type",
    // Credit scores
    "borrower_credit_score",
    "co_borrower_credit_score",
    "qualifying_credit_score",
    // Mortgage lates
    "30day_mortgage_lates_in_06_months",
    "30day_mortgage_lates_in_12_months",
    "30day_mortgage_lates_in_24_months",
    "60day_mortgage_lates_in_12_months",
    "60day_mortgage_lates_in_24_months",
    "90day_mortgage_lates_in_24_months",
    "120day_mortgage_lates_in_12_months",
    "lates_in_last_12_months",
    // Credit events
    "credit_event_major",
    "credit_event_type",
    "credit_event_seasoning",
    "fc_seasoning",
    "ss_seasoning",
    "dil_seasoning",
    "bk_seasoning",
    // Appraisal
    "appraisal_review_required",
    "number_of_appraisals",
    "appraisal_transfer_allowed",
    "cu_score",
    // Property
    "property_type",
    "property_value",
    "property_state",
    "property_address",
    "occupancy",
    "non_warrantable_condos_allowed",
    "condotels_allowed",
    "length_of_ownership",
    // Borrower
    "borrower_contribution",
    "eligible_borrowers",
    "ineligible_borrowers",
    "first_time_homebuyer",
    "first_time_investor",
    "citizenship",
    "entities_allowed_to_title",
    // Funds
    "gifts_for_down_payment",
    "gift_funds_for_reserves",
    "business_funds_for_down_payment",
    // Income
    "income",
    "channel",
    // Product features
    "temp_buydown_allowed",
    "interest_only_period",
    "prepayment_penalty",
    "prepayment_penalty_investment_properties",
    "lien_position",
    "products",
    // Underwriting
    "aus_required",
    "aus_used",
    "time_since_last_cash_out",
];

/// Number of canonical attribute keys.
pub const ATTRIBUTE_COUNT: usize = ATTRIBUTE_KEYS.len();

fn index_map() -> &'static HashMap<&'static str, usize> {
    static MAP: OnceLock<HashMap<&'static str, usize>> = OnceLock::new();
    MAP.get_or_init(|| {
        ATTRIBUTE_KEYS
            .iter()
            .enumerate()
            .map(|(i, k)| (*k, i))
            .collect()
    })
}

/// Position of a canonical key within [`ATTRIBUTE_KEYS`], if it is one.
pub fn key_index(key: &str) -> Option<usize> {
    index_map().get(key).copied()
}

/// True if `key` is one of the canonical attribute keys.
pub fn is_canonical_key(key: &str) -> bool {
    key_index(key).is_some()
}
