//! Double-entry postings for the contract.
//!
//! Entries are produced in a fixed shape: inception, license recognition,
//! then a support/interest pair for every month of the term. Amounts are
//! rounded to cents here, at the output boundary, using cumulative rounding
//! so that a monthly series sums to the rounded total of the series.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::financing::amortization::AmortizationSchedule;
use crate::types::{round_cents, Money};

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Account {
    #[serde(rename = "Cash")]
    Cash,
    /// Gross contract liability
    #[serde(rename = "Deferred Revenue")]
    DeferredRevenue,
    /// Contra-liability carrying the unearned financing component
    #[serde(rename = "Discount on Deferred Revenue")]
    DiscountOnDeferredRevenue,
    #[serde(rename = "Deferred Financing Income")]
    DeferredFinancingIncome,
    #[serde(rename = "License Revenue")]
    LicenseRevenue,
    #[serde(rename = "Support Revenue")]
    SupportRevenue,
    #[serde(rename = "Interest Income")]
    InterestIncome,
}

impl Account {
    pub fn name(&self) -> &'static str {
        match self {
            Account::Cash => "Cash",
            Account::DeferredRevenue => "Deferred Revenue",
            Account::DiscountOnDeferredRevenue => "Discount on Deferred Revenue",
            Account::DeferredFinancingIncome => "Deferred Financing Income",
            Account::LicenseRevenue => "License Revenue",
            Account::SupportRevenue => "Support Revenue",
            Account::InterestIncome => "Interest Income",
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Entry types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Inception,
    LicenseRecognition,
    SupportRecognition,
    InterestUnwind,
}

/// One side of a journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub account: Account,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Sequential, 1-indexed, gap-free
    pub entry_num: u32,
    pub date: NaiveDate,
    pub description: String,
    pub kind: EntryKind,
    pub debits: Vec<Posting>,
    pub credits: Vec<Posting>,
}

impl JournalEntry {
    pub fn total_debits(&self) -> Money {
        self.debits.iter().map(|p| p.amount).sum()
    }

    pub fn total_credits(&self) -> Money {
        self.credits.iter().map(|p| p.amount).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.total_debits() == self.total_credits()
    }

    /// Credits less debits posted to `account` by this entry.
    pub fn net_credit(&self, account: Account) -> Money {
        let credits: Money = self
            .credits
            .iter()
            .filter(|p| p.account == account)
            .map(|p| p.amount)
            .sum();
        let debits: Money = self
            .debits
            .iter()
            .filter(|p| p.account == account)
            .map(|p| p.amount)
            .sum();
        credits - debits
    }
}

/// A flattened ledger row, one per posting, for tabular export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub entry_num: u32,
    pub date: NaiveDate,
    pub account: Account,
    pub debit: Option<Money>,
    pub credit: Option<Money>,
    pub memo: String,
}

/// Figures the generator needs beyond the schedule itself.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalTerms<'a> {
    pub customer: &'a str,
    pub payment_date: NaiveDate,
    pub cash_received: Money,
    pub financing_component: Money,
    pub license_revenue: Money,
    pub support_revenue: Money,
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Splits a running series into cent amounts whose sum always equals the
/// rounded running total.
#[derive(Debug, Default)]
struct CentAllocator {
    cumulative: Money,
    booked: Money,
}

impl CentAllocator {
    fn next(&mut self, amount: Money) -> Money {
        self.cumulative += amount;
        let target = round_cents(self.cumulative);
        let cents = target - self.booked;
        self.booked = target;
        cents
    }

    /// Final slice of the series: whatever remains to reach `total`.
    fn close(&mut self, total: Money) -> Money {
        let target = round_cents(total);
        let cents = target - self.booked;
        self.booked = target;
        self.cumulative = total;
        cents
    }
}

struct EntryBuilder {
    entries: Vec<JournalEntry>,
}

impl EntryBuilder {
    fn push(
        &mut self,
        date: NaiveDate,
        description: String,
        kind: EntryKind,
        debits: &[(Account, Money)],
        credits: &[(Account, Money)],
    ) {
        let mut dr = Vec::with_capacity(debits.len());
        let mut cr = Vec::with_capacity(credits.len());

        // A negative amount is posted to the opposite side.
        for &(account, amount) in debits {
            if amount < Decimal::ZERO {
                cr.push(Posting { account, amount: -amount });
            } else {
                dr.push(Posting { account, amount });
            }
        }
        for &(account, amount) in credits {
            if amount < Decimal::ZERO {
                dr.push(Posting { account, amount: -amount });
            } else {
                cr.push(Posting { account, amount });
            }
        }

        let entry_num = self.entries.len() as u32 + 1;
        self.entries.push(JournalEntry {
            entry_num,
            date,
            description,
            kind,
            debits: dr,
            credits: cr,
        });
    }
}

/// Generate the full, balanced set of journal entries.
pub fn generate_entries(terms: &JournalTerms<'_>, schedule: &AmortizationSchedule) -> Vec<JournalEntry> {
    let mut builder = EntryBuilder {
        entries: Vec::with_capacity(2 + schedule.rows.len() * 2),
    };

    let cash = round_cents(terms.cash_received);
    let financing = round_cents(terms.financing_component);
    builder.push(
        terms.payment_date,
        format!("Initial cash receipt - {}", terms.customer),
        EntryKind::Inception,
        &[
            (Account::Cash, cash),
            (Account::DiscountOnDeferredRevenue, financing),
        ],
        &[
            (Account::DeferredRevenue, cash),
            (Account::DeferredFinancingIncome, financing),
        ],
    );

    let license = round_cents(terms.license_revenue);
    builder.push(
        terms.payment_date,
        "License revenue recognition (point in time)".to_string(),
        EntryKind::LicenseRecognition,
        &[(Account::DeferredRevenue, license)],
        &[(Account::LicenseRevenue, license)],
    );

    let mut support_cents = CentAllocator::default();
    let mut interest_cents = CentAllocator::default();

    let last_month = schedule.rows.len() as u32;

    for row in &schedule.rows {
        let is_last = row.month == last_month;
        let support = if is_last {
            support_cents.close(terms.support_revenue)
        } else {
            support_cents.next(row.support_revenue)
        };
        builder.push(
            row.date,
            format!("Support revenue - Month {} (Period {})", row.month, row.period),
            EntryKind::SupportRecognition,
            &[(Account::DeferredRevenue, support)],
            &[(Account::SupportRevenue, support)],
        );

        let interest = if is_last {
            interest_cents.close(terms.financing_component)
        } else {
            interest_cents.next(row.interest_income)
        };
        builder.push(
            row.date,
            format!("Financing component unwind - Month {}", row.month),
            EntryKind::InterestUnwind,
            &[
                (Account::DeferredRevenue, interest),
                (Account::DeferredFinancingIncome, interest),
            ],
            &[
                (Account::DiscountOnDeferredRevenue, interest),
                (Account::InterestIncome, interest),
            ],
        );
    }

    tracing::debug!(entries = builder.entries.len(), "journal entries generated");
    builder.entries
}

/// Flatten entries into one ledger row per posting, debits first.
pub fn ledger_lines(entries: &[JournalEntry]) -> Vec<LedgerLine> {
    let mut lines = Vec::new();
    for entry in entries {
        for p in &entry.debits {
            lines.push(LedgerLine {
                entry_num: entry.entry_num,
                date: entry.date,
                account: p.account,
                debit: Some(p.amount),
                credit: None,
                memo: entry.description.clone(),
            });
        }
        for p in &entry.credits {
            lines.push(LedgerLine {
                entry_num: entry.entry_num,
                date: entry.date,
                account: p.account,
                debit: None,
                credit: Some(p.amount),
                memo: entry.description.clone(),
            });
        }
    }
    lines
}

/// Net balance (credits less debits) of `account` across all entries.
pub fn account_net_credit(entries: &[JournalEntry], account: Account) -> Money {
    entries.iter().map(|e| e.net_credit(account)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financing::amortization::{build_schedule, ScheduleTerms};
    use rust_decimal_macros::dec;

    fn payment_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    fn schedule() -> AmortizationSchedule {
        build_schedule(&ScheduleTerms {
            payment_date: payment_date(),
            cash_received: dec!(1500000),
            license_revenue: dec!(267695.286358987),
            support_revenue: dec!(1070781.145435948),
            financing_component: dec!(161523.568205065),
            total_months: 60,
        })
        .unwrap()
    }

    fn terms() -> JournalTerms<'static> {
        JournalTerms {
            customer: "Acme Corp",
            payment_date: payment_date(),
            cash_received: dec!(1500000),
            financing_component: dec!(161523.568205065),
            license_revenue: dec!(267695.286358987),
            support_revenue: dec!(1070781.145435948),
        }
    }

    #[test]
    fn test_entry_count_and_numbering() {
        let entries = generate_entries(&terms(), &schedule());
        assert_eq!(entries.len(), 2 + 60 * 2);
        for (i, e) in entries.iter().enumerate() {
            assert_eq!(e.entry_num, i as u32 + 1);
        }
    }

    #[test]
    fn test_every_entry_balances() {
        for e in generate_entries(&terms(), &schedule()) {
            assert!(e.is_balanced(), "entry {} unbalanced: {:?}", e.entry_num, e);
        }
    }

    #[test]
    fn test_inception_entry() {
        let entries = generate_entries(&terms(), &schedule());
        let inception = &entries[0];
        assert_eq!(inception.kind, EntryKind::Inception);
        assert_eq!(inception.date, payment_date());
        assert_eq!(inception.net_credit(Account::Cash), dec!(-1500000));
        assert_eq!(
            inception.net_credit(Account::DiscountOnDeferredRevenue),
            dec!(-161523.57)
        );
        assert_eq!(inception.net_credit(Account::DeferredRevenue), dec!(1500000));
    }

    #[test]
    fn test_series_sum_to_rounded_totals() {
        let entries = generate_entries(&terms(), &schedule());
        let support = account_net_credit(&entries, Account::SupportRevenue);
        let interest = account_net_credit(&entries, Account::InterestIncome);
        assert_eq!(support, dec!(1070781.15));
        assert_eq!(interest, dec!(161523.57));
    }

    #[test]
    fn test_all_balances_close() {
        let entries = generate_entries(&terms(), &schedule());
        assert_eq!(account_net_credit(&entries, Account::DiscountOnDeferredRevenue), Decimal::ZERO);
        assert_eq!(account_net_credit(&entries, Account::DeferredFinancingIncome), Decimal::ZERO);
        assert!(account_net_credit(&entries, Account::DeferredRevenue).abs() <= dec!(0.02));
    }

    #[test]
    fn test_interest_matches_schedule_rows() {
        let s = schedule();
        let entries = generate_entries(&terms(), &s);
        let unwinds: Vec<&JournalEntry> = entries
            .iter()
            .filter(|e| e.kind == EntryKind::InterestUnwind)
            .collect();
        assert_eq!(unwinds.len(), s.rows.len());
        for (entry, row) in unwinds.iter().zip(&s.rows) {
            let contra_reduction = entry.net_credit(Account::DiscountOnDeferredRevenue);
            assert!(
                (contra_reduction - row.interest_income).abs() <= dec!(0.01),
                "month {}: {} vs {}",
                row.month,
                contra_reduction,
                row.interest_income
            );
            assert_eq!(entry.date, row.date);
        }
    }

    #[test]
    fn test_negative_amount_switches_side() {
        let mut builder = EntryBuilder { entries: Vec::new() };
        builder.push(
            payment_date(),
            "premium".to_string(),
            EntryKind::Inception,
            &[(Account::Cash, dec!(100)), (Account::DiscountOnDeferredRevenue, dec!(-10))],
            &[(Account::DeferredRevenue, dec!(100)), (Account::DeferredFinancingIncome, dec!(-10))],
        );
        let e = &builder.entries[0];
        assert!(e.is_balanced());
        assert!(e.debits.iter().all(|p| p.amount >= Decimal::ZERO));
        assert!(e.credits.iter().all(|p| p.amount >= Decimal::ZERO));
        assert_eq!(e.net_credit(Account::DiscountOnDeferredRevenue), dec!(10));
    }

    #[test]
    fn test_cent_allocator_preserves_total() {
        let mut alloc = CentAllocator::default();
        let total: Money = (0..3).map(|_| alloc.next(dec!(0.3333333))).sum();
        assert_eq!(total, dec!(1.00));
    }

    #[test]
    fn test_cent_allocator_close_hits_target() {
        let mut alloc = CentAllocator::default();
        let first = alloc.next(dec!(0.504));
        let last = alloc.close(dec!(1.01));
        assert_eq!(first, dec!(0.50));
        assert_eq!(last, dec!(0.51));
    }

    #[test]
    fn test_ledger_lines() {
        let entries = generate_entries(&terms(), &schedule());
        let lines = ledger_lines(&entries[..2]);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0].account, Account::Cash);
        assert_eq!(lines[0].debit, Some(dec!(1500000.00)));
        assert!(lines[0].credit.is_none());
        assert_eq!(lines[5].account, Account::LicenseRevenue);
    }

    #[test]
    fn test_account_serializes_as_display_name() {
        let json = serde_json::to_string(&Account::DiscountOnDeferredRevenue).unwrap();
        assert_eq!(json, "\"Discount on Deferred Revenue\"");
    }
}
