//! Reference snapshots shared by tests across the workspace.
//!
//! All dates are relative to [`MARKET_CONTEXT`]'s `as_of` of 2025-06-30.

/// Preclinical, single-program company with low burn and a recent raise.
pub const EFFICIENT_PRECLINICAL_COMPANY: &str = r#"
basic_info:
  name: Lumen Therapeutics
  stage: preclinical
  therapeutic_areas:
    - Dermatology
  founded_year: 2021
  employee_count: 18
  headquarters: Boston, MA
financials:
  burn_rate: 1.5
  cash_position: 36.0
  runway: 24.0
  funding_history:
    - round_type: Seed
      amount: 12.0
      date: 2023-02-15
      investors:
        - Atlas Seed Fund
    - round_type: Series A
      amount: 40.0
      date: 2025-01-10
      investors:
        - Northpoint Ventures
        - Helix Capital
pipeline:
  programs:
    - name: LT-101
      mechanism: Topical JAK1 inhibitor
      indication: Atopic dermatitis
      stage: preclinical
      milestones:
        - description: IND-enabling toxicology complete
          target_date: 2025-03-31
          completed: true
        - description: IND submission
          target_date: 2025-12-15
          completed: false
regulatory:
  pathway: abbreviated
  clinical_trials: []
  timeline:
    expected_submission: 2028-06-30
    expected_approval: 2029-06-30
market:
  addressable_market: 2.4
  target_population: 1500000
  competitors:
    - Incyte
    - Pfizer
"#;

/// Phase 3 oncology company: two Phase 3 trials, six months of runway,
/// stale funding and two overdue milestones.
pub const CLINICAL_COMPANY: &str = r#"
basic_info:
  name: Corvane Oncology
  stage: phase3
  therapeutic_areas:
    - Oncology
    - Immunology
  founded_year: 2014
  employee_count: 160
  headquarters: San Diego, CA
financials:
  burn_rate: 8.0
  cash_position: 48.0
  runway: 6.0
  funding_history:
    - round_type: Series C
      amount: 120.0
      date: 2023-09-01
      investors:
        - Orbit Bio Partners
pipeline:
  programs:
    - name: CV-301
      mechanism: KRAS G12C inhibitor
      indication: Non-small cell lung cancer
      stage: phase3
      milestones:
        - description: Phase 3 topline readout
          target_date: 2025-03-31
          completed: true
        - description: NDA submission
          target_date: 2025-06-15
          completed: false
    - name: CV-205
      mechanism: Bispecific T-cell engager
      indication: Colorectal cancer
      stage: phase2
      milestones:
        - description: Phase 2 interim analysis
          target_date: 2025-01-31
          completed: false
    - name: CV-110
      mechanism: Anti-IL-23 antibody
      indication: Psoriasis
      stage: phase1
      milestones:
        - description: First patient dosed
          target_date: 2024-11-30
          completed: true
regulatory:
  pathway: breakthrough
  clinical_trials:
    - id: NCT04512345
      phase: phase3
      status: completed
      indication: Non-small cell lung cancer
      enrollment: 640
      primary_endpoint: Overall survival
      start_date: 2021-04-01
    - id: NCT05123456
      phase: phase3
      status: active
      indication: Non-small cell lung cancer, first line
      enrollment: 820
      primary_endpoint: Progression-free survival
      start_date: 2023-01-15
    - id: NCT05987654
      phase: phase2
      status: recruiting
      indication: Colorectal cancer
      enrollment: 140
      primary_endpoint: Objective response rate
      start_date: 2024-05-01
  timeline:
    expected_submission: 2025-09-30
    expected_approval: 2026-07-31
market:
  addressable_market: 12.5
  target_population: 230000
  competitors:
    - Amgen
    - Mirati
    - Revolution Medicines
"#;

/// Clinical-stage company reporting zero burn. Fails validation.
pub const ZERO_BURN_COMPANY: &str = r#"
basic_info:
  name: Dormant Bio
  stage: phase1
  therapeutic_areas:
    - Metabolic
financials:
  burn_rate: 0.0
  cash_position: 5.0
pipeline:
  programs:
    - name: DB-01
      mechanism: GLP-1 agonist
      indication: Obesity
      stage: phase1
market:
  addressable_market: 8.0
"#;

/// Neutral market with an open IPO window. One comparable lacks a valuation.
pub const MARKET_CONTEXT: &str = r#"
as_of: 2025-06-30
benchmarks:
  median_burn_rate: 4.5
  median_runway_months: 18.0
  median_valuation: 450.0
conditions:
  sentiment: neutral
  ipo_window_open: true
  biotech_index_change_pct: -4.2
comparables:
  - name: Arvelle Bio
    stage: phase2
    therapeutic_areas:
      - Oncology
    valuation: 620.0
  - name: Kestrel Genomics
    stage: phase1
    therapeutic_areas:
      - Rare Diseases
    valuation: 310.0
  - name: Solis Dermatology
    stage: phase3
    therapeutic_areas:
      - Dermatology
industry_metrics:
  median_phase2_success_rate: 0.31
  median_years_to_ipo: 6.5
"#;

/// The stock pillar weights as a scoring configuration.
pub const BALANCED_WEIGHTS: &str = r#"
weights:
  capital_intensity: 0.25
  market_potential: 0.25
  pipeline_strength: 0.20
  regulatory_risk: 0.30
"#;

/// Weights that let one pillar dominate and leave one out.
pub const SKEWED_WEIGHTS: &str = r#"
weights:
  capital_intensity: 6.0
  market_potential: 1.0
  regulatory_risk: 3.0
"#;
