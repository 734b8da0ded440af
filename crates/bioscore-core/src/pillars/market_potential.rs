//! Market Potential Pillar
//!
//! **Question**: Is there a large, reachable market for the lead assets?
//!
//! ## Factors
//!
//! | Factor | Weight | Driver |
//! |--------|--------|--------|
//! | Market Size | 0.35 | Addressable market, USD B |
//! | Competitive Landscape | 0.25 | Named competitors plus comparables in the same areas |
//! | Therapeutic Demand | 0.20 | High-demand areas, breadth |
//! | Market Conditions | 0.20 | Sentiment, IPO window, biotech index |

use crate::confidence::{QualitySignals, RecordCoverage};
use crate::heuristics::{BucketTable, LookupTable, HIGH_DEMAND_KEYWORDS};
use crate::types::{
    CompanyData, MarketContext, MarketSentiment, PillarId, PillarInfo, PillarScore,
    ScoringFactor, ValidationCode, ValidationResult,
};
use crate::validation::{self, ValidationBuilder};
use crate::ScoringError;

use super::{ensure_valid, finish, Assessment, FactorBuilder, PillarConfig, PillarScorer};

const REQUIRED_FIELDS: &[&str] = &[
    "basic_info.therapeutic_areas",
    "market.addressable_market",
    "market.competitors",
];

/// Addressable market, USD billions.
const MARKET_SIZE: BucketTable = BucketTable::new(
    0.0,
    &[(0.5, 1.5), (1.0, 2.5), (5.0, 3.5), (20.0, 4.2)],
    4.8,
);

/// Number of competitors.
const COMPETITION: BucketTable = BucketTable::new(
    0.0,
    &[(2.0, 4.5), (5.0, 3.5), (10.0, 2.5)],
    1.5,
);

const SENTIMENT: LookupTable<MarketSentiment> = LookupTable::new(
    &[
        (MarketSentiment::Bull, 4.5),
        (MarketSentiment::Neutral, 3.5),
        (MarketSentiment::Bear, 2.0),
    ],
    3.5,
);

const THERAPEUTIC_DEMAND_BASE: f64 = 3.0;
const SMALL_MARKET_BILLIONS: f64 = 0.5;
const CROWDED_COMPETITOR_COUNT: usize = 10;
const INDEX_DOWNTURN_PCT: f64 = -10.0;

/// The Market Potential pillar.
pub struct MarketPotentialPillar {
    config: PillarConfig,
}

impl MarketPotentialPillar {
    pub fn new(config: PillarConfig) -> Self {
        Self { config }
    }

    /// Named competitors plus comparables sharing a therapeutic area.
    fn competitor_count(&self, data: &CompanyData, context: &MarketContext) -> usize {
        let areas: Vec<String> = data
            .basic_info
            .therapeutic_areas
            .iter()
            .map(|area| area.trim().to_lowercase())
            .collect();

        let comparables = context
            .comparables
            .iter()
            .filter(|comparable| {
                comparable
                    .therapeutic_areas
                    .iter()
                    .any(|area| areas.contains(&area.trim().to_lowercase()))
            })
            .count();

        data.market.competitors.len() + comparables
    }

    fn market_size(&self, market_billions: f64, context: &MarketContext) -> ScoringFactor {
        let peer = context
            .benchmarks
            .median_valuation
            .map(|median| format!("Sector median valuation is ${:.0}M", median));

        FactorBuilder::new(
            "Market Size",
            0.35,
            MARKET_SIZE.score(market_billions),
            format!(
                "${:.1}B addressable market falls in {}",
                market_billions,
                MARKET_SIZE.label(market_billions)
            ),
        )
        .note(peer)
        .build()
    }

    fn competitive_landscape(&self, competitors: usize) -> ScoringFactor {
        let count = competitors as f64;
        FactorBuilder::new(
            "Competitive Landscape",
            0.25,
            COMPETITION.score(count),
            format!("{} competitors fall in {}", competitors, COMPETITION.label(count)),
        )
        .build()
    }

    fn therapeutic_demand(&self, data: &CompanyData) -> ScoringFactor {
        let areas = &data.basic_info.therapeutic_areas;
        let high_demand = HIGH_DEMAND_KEYWORDS.find_in(areas.iter().map(String::as_str));

        FactorBuilder::new(
            "Therapeutic Demand",
            0.20,
            THERAPEUTIC_DEMAND_BASE,
            format!("Base {:.1}", THERAPEUTIC_DEMAND_BASE),
        )
        .adjust(
            high_demand.is_some(),
            0.5,
            format!("High-demand area ({})", high_demand.unwrap_or_default()),
        )
        .adjust(areas.len() >= 2, 0.3, format!("{} therapeutic areas", areas.len()))
        .build()
    }

    fn market_conditions(&self, context: &MarketContext) -> ScoringFactor {
        let conditions = &context.conditions;
        let base = SENTIMENT.get(conditions.sentiment);

        FactorBuilder::new(
            "Market Conditions",
            0.20,
            base,
            format!("{:?} sentiment base {:.1}", conditions.sentiment, base),
        )
        .adjust(conditions.ipo_window_open, 0.3, "IPO window open")
        .adjust(
            conditions.biotech_index_change_pct < INDEX_DOWNTURN_PCT,
            -0.3,
            format!(
                "Biotech index down {:.1}%",
                conditions.biotech_index_change_pct.abs()
            ),
        )
        .build()
    }
}

impl PillarScorer for MarketPotentialPillar {
    fn pillar_id(&self) -> PillarId {
        PillarId::MarketPotential
    }

    fn pillar_info(&self) -> PillarInfo {
        PillarInfo {
            id: PillarId::MarketPotential,
            name: PillarId::MarketPotential.name().to_string(),
            description: "Commercial opportunity from market size, competition, therapeutic demand \
                          and prevailing market conditions"
                .to_string(),
            methodology_reliability: self.config.methodology_reliability,
        }
    }

    fn required_fields(&self) -> &'static [&'static str] {
        REQUIRED_FIELDS
    }

    fn validate_data(&self, data: &CompanyData) -> ValidationResult {
        let mut builder = ValidationBuilder::new();

        match data.market.addressable_market {
            None => {
                builder.missing("market.addressable_market");
            }
            Some(size) if !size.is_finite() => {
                builder.error(
                    "market.addressable_market",
                    ValidationCode::Malformed,
                    "Addressable market is not a finite number",
                );
            }
            Some(size) if size < 0.0 => {
                builder.error(
                    "market.addressable_market",
                    ValidationCode::OutOfRange,
                    format!("Addressable market cannot be negative, got {}", size),
                );
            }
            Some(_) => {}
        }

        if !validation::field_present(data, "basic_info.therapeutic_areas") {
            builder.warn("basic_info.therapeutic_areas", "No therapeutic areas listed");
        }

        builder.finish(validation::completeness(data, REQUIRED_FIELDS))
    }

    fn calculate_score(
        &self,
        data: &CompanyData,
        context: &MarketContext,
    ) -> Result<PillarScore, ScoringError> {
        ensure_valid(self.validate_data(data))?;

        let market = data.market.addressable_market.ok_or_else(|| {
            ScoringError::MissingRequiredField("market.addressable_market".to_string())
        })?;
        let competitors = self.competitor_count(data, context);

        let factors = vec![
            self.market_size(market, context),
            self.competitive_landscape(competitors),
            self.therapeutic_demand(data),
            self.market_conditions(context),
        ];

        let mut red_flags = Vec::new();
        if context.conditions.sentiment == MarketSentiment::Bear {
            red_flags.push("Unfavorable market conditions may delay IPO timing".to_string());
        }
        if market < SMALL_MARKET_BILLIONS {
            red_flags.push("Limited addressable market may constrain valuation".to_string());
        }
        if competitors >= CROWDED_COMPETITOR_COUNT {
            red_flags.push("Crowded competitive landscape".to_string());
        }

        let quality = QualitySignals {
            stale: false,
            inconsistent: false,
            missing_context: context.comparables.is_empty(),
            coverage: Some(RecordCoverage::of(&context.comparables, |c| {
                c.valuation.is_some()
            })),
        };

        Ok(finish(
            PillarId::MarketPotential,
            &self.config,
            data,
            REQUIRED_FIELDS,
            Assessment {
                factors,
                red_flags,
                quality,
            },
        ))
    }
}
