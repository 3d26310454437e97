//! Borrower-criteria extraction from query text.
//!
//! Numeric values are picked up on either side of their cue word ("680
//! credit score" and "credit score of 680" both work); categorical fields
//! use word-boundary cues with first-match precedence.

use regex::Regex;

use crate::profile::BorrowerProfile;

pub(crate) struct BorrowerPatterns {
    credit_before: Regex,
    credit_after: Regex,
    amount_before: Regex,
    amount_after: Regex,
    ltv_before: Regex,
    ltv_after: Regex,
    cltv_before: Regex,
    cltv_after: Regex,
    dti_before: Regex,
    dti_after: Regex,
    reserves_before: Regex,
    reserves_after: Regex,
    purchase: Regex,
    cash_out: Regex,
    rate_term: Regex,
    owner_occupied: Regex,
    second_home: Regex,
    investment: Regex,
}

impl BorrowerPatterns {
    pub(crate) fn new() -> Self {
        let compile = |pattern: &str| Regex::new(pattern).expect("borrower pattern compiles");
        BorrowerPatterns {
            credit_before: compile(r"(?i)\b(\d{3})\s*(?:credit\s*score|fico)\b"),
            credit_after: compile(r"(?i)\b(?:credit\s*score|fico)\s*(?:of|is|at|:|=)?\s*(\d{3})\b"),
            amount_before: compile(r"(?i)\$?([\d,]+(?:\.\d+)?)\s*loan\s*amount\b"),
            amount_after: compile(r"(?i)\bloan\s*amount\s*(?:of|is|at|:|=)?\s*\$?([\d,]+(?:\.\d+)?)\b"),
            ltv_before: compile(r"(?i)\b(\d+(?:\.\d+)?)\s*%?\s*ltv\b"),
            ltv_after: compile(r"(?i)\bltv\s*(?:of|is|at|:|=)?\s*(\d+(?:\.\d+)?)\s*%?"),
            cltv_before: compile(r"(?i)\b(\d+(?:\.\d+)?)\s*%?\s*cltv\b"),
            cltv_after: compile(r"(?i)\bcltv\s*(?:of|is|at|:|=)?\s*(\d+(?:\.\d+)?)\s*%?"),
            dti_before: compile(r"(?i)\b(\d+(?:\.\d+)?)\s*%?\s*dti\b"),
            dti_after: compile(r"(?i)\bdti\s*(?:of|is|at|:|=)?\s*(\d+(?:\.\d+)?)\s*%?"),
            reserves_before: compile(r"(?i)\b(\d+)\s*(?:months?|mos?)\s*(?:of\s*)?reserves?\b"),
            reserves_after: compile(r"(?i)\breserves?\s*(?:of|:|=)?\s*(\d+)\s*(?:months?|mos?)\b"),
            purchase: compile(r"(?i)\bpurchase\b"),
            cash_out: compile(r"(?i)\bcash[\s-]*out\b"),
            rate_term: compile(r"(?i)\brate\s*(?:and|&)?\s*term\b"),
            owner_occupied: compile(r"(?i)\bowner\s*occupied\b"),
            second_home: compile(r"(?i)\bsecond\s*home\b"),
            investment: compile(r"(?i)\binvestment\b"),
        }
    }

    pub(crate) fn extract(&self, query: &str) -> BorrowerProfile {
        let mut profile = BorrowerProfile::new();

        if let Some(score) = self.first_number(query, &self.credit_before, &self.credit_after) {
            profile.set("borrower_credit_score", score);
        }
        if let Some(amount) = self.first_number(query, &self.amount_before, &self.amount_after) {
            profile.set("loan_amount", amount);
        }
        if let Some(cltv) = self.first_number(query, &self.cltv_before, &self.cltv_after) {
            profile.set("cltv", cltv);
        }
        if let Some(ltv) = self.first_number(query, &self.ltv_before, &self.ltv_after) {
            profile.set("ltv", ltv);
        }
        if let Some(dti) = self.first_number(query, &self.dti_before, &self.dti_after) {
            profile.set("dti", dti);
        }
        if let Some(months) = self.first_number(query, &self.reserves_before, &self.reserves_after)
        {
            profile.set("reserves", months);
        }

        if self.purchase.is_match(query) {
            profile.set("transaction_type", "Purchase");
        } else if self.cash_out.is_match(query) {
            profile.set("transaction_type", "Cash Out");
        } else if self.rate_term.is_match(query) {
            profile.set("transaction_type", "Rate & Term");
        }

        if self.owner_occupied.is_match(query) {
            profile.set("occupancy", "Owner Occupied");
        } else if self.second_home.is_match(query) {
            profile.set("occupancy", "Second Home");
        } else if self.investment.is_match(query) {
            profile.set("occupancy", "Investment");
        }

        profile
    }

    fn first_number(&self, query: &str, before: &Regex, after: &Regex) -> Option<f64> {
        for pattern in [before, after] {
            if let Some(caps) = pattern.captures(query) {
                let raw: String = caps[1].chars().filter(|c| *c != ',').collect();
                if let Ok(value) = raw.parse::<f64>() {
                    return Some(value);
                }
            }
        }
        None
    }
}
