//! Deterministic eligibility screening at intake.
//!
//! Each scheme carries a [`SchemeRules`] entry: hard criteria, income bands,
//! the documents an applicant must bring and the fallback schemes worth
//! suggesting. [`assess`] runs a citizen [`Profile`] through the entry for
//! the requested scheme and produces a [`Triage`] that is stored with the
//! case. The outcome assists operators; it never decides a case on its own.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{Error, Result};

// ─── Profile ─────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
pub enum Gender {
  #[serde(rename = "M")]
  #[strum(serialize = "M")]
  Male,
  #[serde(rename = "F")]
  #[strum(serialize = "F")]
  Female,
  #[serde(rename = "O")]
  #[strum(serialize = "O")]
  Other,
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IncomePeriod {
  #[default]
  Annual,
  Monthly,
}

pub const MAX_AGE: u32 = 120;

/// Self-reported applicant details submitted with an intake request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
  pub age:                Option<u32>,
  pub gender:             Option<Gender>,
  /// Household income in rupees. Without it no rule can conclude.
  pub income:             Option<u64>,
  pub income_period:      IncomePeriod,
  pub rural:              bool,
  pub caste_marginalized: bool,
}

impl Profile {
  pub fn validate(&self) -> Result<()> {
    if let Some(age) = self.age
      && age > MAX_AGE
    {
      return Err(Error::validation(format!("age out of range: {age}")));
    }
    Ok(())
  }

  /// Income over a full year, if known.
  pub fn annual_income(&self) -> Option<u64> {
    self.income.map(|income| match self.income_period {
      IncomePeriod::Annual => income,
      IncomePeriod::Monthly => income.saturating_mul(12),
    })
  }
}

// ─── Rule configuration ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeBand {
  pub name: String,
  /// Inclusive annual ceiling.
  pub max:  u64,
}

/// Hard criteria. An empty list or a zero value disables that check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Criteria {
  pub min_age:               u32,
  pub genders:               Vec<Gender>,
  pub must_be_rural:         bool,
  pub requires_marginalized: bool,
  /// Checked in order; the first band the income fits is reported as a tag.
  pub income_bands:          Vec<IncomeBand>,
}

/// Which proof of income to ask for, split at `threshold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeProof {
  pub threshold: u64,
  pub below:     String,
  pub above:     String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentRules {
  pub required:        Vec<String>,
  pub if_rural:        Vec<String>,
  pub if_marginalized: Vec<String>,
  pub income_proof:    Option<IncomeProof>,
}

/// Flags incomes that miss the limit by at most `margin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NearMissRule {
  pub limit:  u64,
  pub margin: u64,
}

/// Suggest `scheme` when every condition that is set matches the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeHint {
  pub scheme:       String,
  #[serde(default)]
  pub gender:       Option<Gender>,
  #[serde(default)]
  pub rural:        Option<bool>,
  /// Annual income strictly below this value.
  #[serde(default)]
  pub income_below: Option<u64>,
}

impl AlternativeHint {
  fn matches(&self, profile: &Profile) -> bool {
    self.gender.is_none_or(|g| profile.gender == Some(g))
      && self.rural.is_none_or(|r| profile.rural == r)
      && self
        .income_below
        .is_none_or(|cap| profile.annual_income().unwrap_or(0) < cap)
  }
}

/// Screening configuration for one scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeRules {
  pub scheme_code:  String,
  #[serde(default)]
  pub criteria:     Criteria,
  /// Suggested when the applicant does not qualify outright.
  #[serde(default)]
  pub alternatives: Vec<String>,
  #[serde(default)]
  pub documents:    DocumentRules,
  #[serde(default)]
  pub near_miss:    Option<NearMissRule>,
  #[serde(default)]
  pub hints:        Vec<AlternativeHint>,
}

/// Asked of every applicant regardless of scheme.
pub const IDENTITY_DOCUMENT: &str = "Aadhaar Card (Identity Proof)";

/// Rules for the two schemes seeded by default.
pub fn default_rules() -> Vec<SchemeRules> {
  let strings = |names: &[&str]| -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
  };
  vec![
    SchemeRules {
      scheme_code:  "PMAY".into(),
      criteria:     Criteria {
        min_age: 18,
        income_bands: [
          ("EWS", 300_000),
          ("LIG", 600_000),
          ("MIG_I", 1_200_000),
          ("MIG_II", 1_800_000),
        ]
        .into_iter()
        .map(|(name, max)| IncomeBand { name: name.into(), max })
        .collect(),
        ..Criteria::default()
      },
      alternatives: strings(&["STATE_HOUSING", "RENTAL_SUPPORT"]),
      documents:    DocumentRules {
        required: strings(&[
          "Proof of Land Ownership (Patta/Registry)",
          "Bank Account Details",
        ]),
        income_proof: Some(IncomeProof {
          threshold: 300_000,
          below:     "Income Certificate (EWS/LIG)".into(),
          above:     "Income Tax Return (ITR)".into(),
        }),
        ..DocumentRules::default()
      },
      near_miss:    Some(NearMissRule { limit: 300_000, margin: 50_000 }),
      hints:        Vec::new(),
    },
    SchemeRules {
      scheme_code:  "UJJ".into(),
      criteria:     Criteria {
        min_age: 18,
        must_be_rural: true,
        ..Criteria::default()
      },
      alternatives: Vec::new(),
      documents:    DocumentRules {
        required: strings(&[
          "Bank Account Passbook (Front Page)",
          "Ration Card",
          "Passport Size Photo",
        ]),
        if_rural: strings(&["Gram Panchayat Certificate"]),
        if_marginalized: strings(&["Caste Certificate (SC/ST)"]),
        income_proof: None,
      },
      near_miss:    Some(NearMissRule { limit: 250_000, margin: 50_000 }),
      hints:        vec![
        AlternativeHint {
          scheme:       "PMAY".into(),
          gender:       Some(Gender::Male),
          rural:        Some(true),
          income_below: None,
        },
        AlternativeHint {
          scheme:       "MGNREGA (Job Card)".into(),
          gender:       None,
          rural:        Some(true),
          income_below: Some(100_000),
        },
      ],
    },
  ]
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleResult {
  EligibleByRule,
  IneligibleByRule,
  UnknownNeedsDocs,
}

/// The screening outcome stored with a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triage {
  pub rule_result:  RuleResult,
  /// Why the applicant did not qualify. Empty when eligible.
  pub reasons:      Vec<String>,
  /// Documents to collect, identity proof first.
  pub documents:    Vec<String>,
  pub alternatives: Vec<String>,
  /// Non-decision metadata such as the matched income band.
  pub tags:         Vec<String>,
  /// Set when income misses the scheme limit by a small margin.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub flag_reason:  Option<String>,
}

// ─── Assessment ──────────────────────────────────────────────────────────────

/// Screen `profile` against the rules for `scheme_code`.
///
/// A scheme with no configured rules yields `UNKNOWN_NEEDS_DOCS` and the
/// identity document only.
pub fn assess(rules: &[SchemeRules], scheme_code: &str, profile: &Profile) -> Triage {
  match rules.iter().find(|r| r.scheme_code == scheme_code) {
    Some(rules) => rules.assess(profile),
    None => Triage {
      rule_result:  RuleResult::UnknownNeedsDocs,
      reasons:      vec![format!("no eligibility rules for scheme {scheme_code}")],
      documents:    vec![IDENTITY_DOCUMENT.to_string()],
      alternatives: Vec::new(),
      tags:         Vec::new(),
      flag_reason:  None,
    },
  }
}

impl SchemeRules {
  pub fn assess(&self, profile: &Profile) -> Triage {
    let documents = self.document_checklist(profile);
    let flag_reason = self.near_miss(profile);

    let Some(income) = profile.annual_income() else {
      return Triage {
        rule_result: RuleResult::UnknownNeedsDocs,
        reasons: vec!["Income missing".to_string()],
        documents,
        alternatives: self.suggestions(profile, true),
        tags: Vec::new(),
        flag_reason,
      };
    };

    let c = &self.criteria;
    let mut reasons = Vec::new();
    let mut tags = Vec::new();

    if c.min_age > 0 && profile.age.unwrap_or(0) < c.min_age {
      reasons.push(format!("Age must be {}+", c.min_age));
    }
    if !c.genders.is_empty()
      && !profile.gender.is_some_and(|g| c.genders.contains(&g))
    {
      reasons.push("Applicant category not eligible".to_string());
    }
    if c.must_be_rural && !profile.rural {
      reasons.push("Must be rural".to_string());
    }
    if !c.income_bands.is_empty() {
      match c.income_bands.iter().find(|band| income <= band.max) {
        Some(band) => tags.push(format!("{}_BAND:{}", self.scheme_code, band.name)),
        None => reasons.push("Income exceeds all eligible bands".to_string()),
      }
    }
    if c.requires_marginalized && !profile.caste_marginalized {
      reasons.push("Must belong to eligible social category".to_string());
    }

    let eligible = reasons.is_empty();
    Triage {
      rule_result: if eligible {
        RuleResult::EligibleByRule
      } else {
        RuleResult::IneligibleByRule
      },
      reasons,
      documents,
      alternatives: self.suggestions(profile, !eligible),
      tags,
      flag_reason,
    }
  }

  /// Identity proof, then the scheme's fixed list, then anything the
  /// profile triggers.
  pub fn document_checklist(&self, profile: &Profile) -> Vec<String> {
    let d = &self.documents;
    let mut docs = vec![IDENTITY_DOCUMENT.to_string()];
    docs.extend(d.required.iter().cloned());
    if profile.caste_marginalized {
      docs.extend(d.if_marginalized.iter().cloned());
    }
    if profile.rural {
      docs.extend(d.if_rural.iter().cloned());
    }
    if let Some(proof) = &d.income_proof {
      let income = profile.annual_income().unwrap_or(0);
      let doc = if income < proof.threshold { &proof.below } else { &proof.above };
      docs.push(doc.clone());
    }
    docs
  }

  fn near_miss(&self, profile: &Profile) -> Option<String> {
    let rule = self.near_miss?;
    let over = profile.annual_income()?.checked_sub(rule.limit)?;
    (over > 0 && over <= rule.margin).then(|| {
      format!(
        "Near miss: income {over} over the {} limit of {}; verified income \
         after deductions may change eligibility",
        self.scheme_code, rule.limit
      )
    })
  }

  /// Matching hints always; the configured fallbacks only when the
  /// applicant did not qualify.
  fn suggestions(&self, profile: &Profile, with_fallbacks: bool) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let fallbacks = self.alternatives.iter().filter(|_| with_fallbacks);
    let hinted = self
      .hints
      .iter()
      .filter(|h| h.matches(profile))
      .map(|h| &h.scheme);
    for scheme in fallbacks.chain(hinted) {
      if !out.contains(scheme) {
        out.push(scheme.clone());
      }
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn profile(age: u32, gender: Gender, income: u64, rural: bool) -> Profile {
    Profile {
      age: Some(age),
      gender: Some(gender),
      income: Some(income),
      rural,
      ..Profile::default()
    }
  }

  fn rules_for(code: &str) -> SchemeRules {
    default_rules()
      .into_iter()
      .find(|r| r.scheme_code == code)
      .unwrap()
  }

  #[test]
  fn rural_woman_qualifies_for_ujj() {
    let p = Profile {
      caste_marginalized: true,
      ..profile(30, Gender::Female, 50_000, true)
    };
    let t = assess(&default_rules(), "UJJ", &p);
    assert_eq!(t.rule_result, RuleResult::EligibleByRule);
    assert!(t.reasons.is_empty());
    assert_eq!(t.documents[0], IDENTITY_DOCUMENT);
    assert!(t.documents.contains(&"Gram Panchayat Certificate".to_string()));
    assert!(t.documents.contains(&"Caste Certificate (SC/ST)".to_string()));
    assert_eq!(t.alternatives, ["MGNREGA (Job Card)"]);
    assert!(t.flag_reason.is_none());
  }

  #[test]
  fn urban_ujj_applicant_is_ineligible() {
    let t = rules_for("UJJ").assess(&profile(30, Gender::Female, 50_000, false));
    assert_eq!(t.rule_result, RuleResult::IneligibleByRule);
    assert_eq!(t.reasons, ["Must be rural"]);
    assert!(!t.documents.contains(&"Gram Panchayat Certificate".to_string()));
  }

  #[test]
  fn rural_man_is_pointed_to_pmay() {
    let t = rules_for("UJJ").assess(&profile(35, Gender::Male, 150_000, true));
    assert_eq!(t.alternatives, ["PMAY"]);
  }

  #[test]
  fn minors_fail_the_age_check() {
    let t = rules_for("PMAY").assess(&profile(16, Gender::Female, 100_000, false));
    assert_eq!(t.rule_result, RuleResult::IneligibleByRule);
    assert_eq!(t.reasons, ["Age must be 18+"]);
    assert_eq!(t.alternatives, ["STATE_HOUSING", "RENTAL_SUPPORT"]);
  }

  #[test]
  fn pmay_reports_income_band() {
    let t = rules_for("PMAY").assess(&profile(40, Gender::Female, 450_000, false));
    assert_eq!(t.rule_result, RuleResult::EligibleByRule);
    assert_eq!(t.tags, ["PMAY_BAND:LIG"]);
    assert!(t.alternatives.is_empty());
    assert_eq!(t.documents.last().unwrap(), "Income Tax Return (ITR)");
  }

  #[test]
  fn monthly_income_is_annualised() {
    let p = Profile {
      income_period: IncomePeriod::Monthly,
      ..profile(40, Gender::Female, 20_000, false)
    };
    assert_eq!(p.annual_income(), Some(240_000));
    let t = rules_for("PMAY").assess(&p);
    assert_eq!(t.tags, ["PMAY_BAND:EWS"]);
    assert_eq!(t.documents.last().unwrap(), "Income Certificate (EWS/LIG)");
  }

  #[test]
  fn income_above_every_band_is_ineligible() {
    let t = rules_for("PMAY").assess(&profile(40, Gender::Male, 2_000_000, false));
    assert_eq!(t.rule_result, RuleResult::IneligibleByRule);
    assert_eq!(t.reasons, ["Income exceeds all eligible bands"]);
  }

  #[test]
  fn missing_income_needs_documents() {
    let p = Profile { income: None, ..profile(40, Gender::Female, 0, true) };
    let t = rules_for("PMAY").assess(&p);
    assert_eq!(t.rule_result, RuleResult::UnknownNeedsDocs);
    assert_eq!(t.reasons, ["Income missing"]);
    assert_eq!(t.alternatives, ["STATE_HOUSING", "RENTAL_SUPPORT"]);
    assert!(t.documents.len() > 1);
  }

  #[test]
  fn near_miss_just_over_the_limit() {
    let t = rules_for("PMAY").assess(&profile(40, Gender::Female, 310_000, false));
    let flag = t.flag_reason.unwrap();
    assert!(flag.starts_with("Near miss"), "{flag}");
    assert!(flag.contains("10000"));

    for income in [300_000, 350_001] {
      let t = rules_for("PMAY").assess(&profile(40, Gender::Female, income, false));
      assert!(t.flag_reason.is_none(), "{income}");
    }
  }

  #[test]
  fn gender_restriction_applies_when_configured() {
    let mut rules = rules_for("UJJ");
    rules.criteria.genders = vec![Gender::Female];
    let t = rules.assess(&profile(30, Gender::Male, 50_000, true));
    assert_eq!(t.reasons, ["Applicant category not eligible"]);
    let t = rules.assess(&Profile { gender: None, ..profile(30, Gender::Female, 50_000, true) });
    assert_eq!(t.rule_result, RuleResult::IneligibleByRule);
  }

  #[test]
  fn marginalised_requirement_applies_when_configured() {
    let mut rules = rules_for("PMAY");
    rules.criteria.requires_marginalized = true;
    let t = rules.assess(&profile(30, Gender::Female, 100_000, false));
    assert_eq!(t.reasons, ["Must belong to eligible social category"]);
  }

  #[test]
  fn unconfigured_scheme_needs_documents() {
    let t = assess(&default_rules(), "NREGA", &Profile::default());
    assert_eq!(t.rule_result, RuleResult::UnknownNeedsDocs);
    assert_eq!(t.documents, [IDENTITY_DOCUMENT]);
  }

  #[test]
  fn profile_validation() {
    assert!(Profile::default().validate().is_ok());
    let p = Profile { age: Some(300), ..Profile::default() };
    assert!(matches!(p.validate().unwrap_err(), Error::Validation(_)));
  }

  #[test]
  fn profile_wire_format() {
    let p: Profile = serde_json::from_value(serde_json::json!({
      "age": 30, "gender": "F", "income": 1000,
      "income_period": "MONTHLY", "rural": true,
    }))
    .unwrap();
    assert_eq!(p.gender, Some(Gender::Female));
    assert_eq!(p.income_period, IncomePeriod::Monthly);
    assert!(!p.caste_marginalized);
  }
}
