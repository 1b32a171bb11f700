//! Query-type taxonomy and the ordered category battery.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extract;

/// Broad routing category of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    UiBasic,
    UiFormatting,
    UiFiltering,
    UiCellOperations,
    AnalyticsStatistical,
    AnalyticsComparative,
    AnalyticsTrend,
    AnalyticsCorrelation,
    AnalyticsPredictive,
    AnalyticsAggregation,
    VisualizationChart,
    VisualizationDashboard,
    MixedUiAnalytics,
    MixedAnalyticsViz,
    TrueCompound,
    Unknown,
}

/// Family used for capability defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFamily {
    Ui,
    Analytics,
    Visualization,
    Mixed,
    Compound,
    Unknown,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::UiBasic => "UI_BASIC",
            QueryType::UiFormatting => "UI_FORMATTING",
            QueryType::UiFiltering => "UI_FILTERING",
            QueryType::UiCellOperations => "UI_CELL_OPERATIONS",
            QueryType::AnalyticsStatistical => "ANALYTICS_STATISTICAL",
            QueryType::AnalyticsComparative => "ANALYTICS_COMPARATIVE",
            QueryType::AnalyticsTrend => "ANALYTICS_TREND",
            QueryType::AnalyticsCorrelation => "ANALYTICS_CORRELATION",
            QueryType::AnalyticsPredictive => "ANALYTICS_PREDICTIVE",
            QueryType::AnalyticsAggregation => "ANALYTICS_AGGREGATION",
            QueryType::VisualizationChart => "VISUALIZATION_CHART",
            QueryType::VisualizationDashboard => "VISUALIZATION_DASHBOARD",
            QueryType::MixedUiAnalytics => "MIXED_UI_ANALYTICS",
            QueryType::MixedAnalyticsViz => "MIXED_ANALYTICS_VIZ",
            QueryType::TrueCompound => "TRUE_COMPOUND",
            QueryType::Unknown => "UNKNOWN",
        }
    }

    pub fn family(&self) -> QueryFamily {
        match self {
            QueryType::UiBasic
            | QueryType::UiFormatting
            | QueryType::UiFiltering
            | QueryType::UiCellOperations => QueryFamily::Ui,
            QueryType::AnalyticsStatistical
            | QueryType::AnalyticsComparative
            | QueryType::AnalyticsTrend
            | QueryType::AnalyticsCorrelation
            | QueryType::AnalyticsPredictive
            | QueryType::AnalyticsAggregation => QueryFamily::Analytics,
            QueryType::VisualizationChart | QueryType::VisualizationDashboard => {
                QueryFamily::Visualization
            }
            QueryType::MixedUiAnalytics | QueryType::MixedAnalyticsViz => QueryFamily::Mixed,
            QueryType::TrueCompound => QueryFamily::Compound,
            QueryType::Unknown => QueryFamily::Unknown,
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static COMPARATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bcompar(?:e|es|ed|ing|ison)\b|\bdifferences?\b.*\bbetween\b|\bversus\b|\bvs\.?\s|\brelative\s+to\b|\bhow\s+does\s+.+\s+differ\b").unwrap()
});

static UI_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:sort|filter|highlight|delete|remove|insert|hide|unhide|freeze|format|bold|merge|colou?r|rename)\b").unwrap()
});

static LEADING_UI_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:please\s+)?(?:sort|filter|highlight|delete|remove|insert|hide|unhide|freeze|format|bold|merge|colou?r|rename)\b").unwrap()
});

static QUESTION_FRAMING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:what|how|which|why)\b|\bshow\s+me\s+the\b|\?").unwrap()
});

static ANALYSIS_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:average|mean|median|sum|total|count|analy[sz]e|analysis|statistics?|distribution|trends?|correlat\w*|predict\w*|forecast\w*|insights?|summari[sz]e|summary|variance|deviation)\b").unwrap()
});

static VIZ_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:charts?|graphs?|plot|visuali[sz]e|visuali[sz]ation|histogram|pie|scatter|dashboard)\b").unwrap()
});

static DASHBOARD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bdashboard\b|\b(?:multiple|several|a\s+few)\s+(?:charts|graphs|plots)\b|\breport\s+with\s+(?:charts|graphs)\b").unwrap()
});

static CORRELATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bcorrelat\w*|\brelationship\s+between\b|\bassociat\w+\s+(?:with|between)\b|\bdoes\s+.+\s+affect\b").unwrap()
});

static TREND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\btrends?\b|\bover\s+time\b|\bgrowth\b|\b(?:monthly|yearly|weekly|quarterly|annual)\b|\bseasonal\w*|\byear\s+over\s+year\b").unwrap()
});

static PREDICTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bpredict\w*|\bforecast\w*|\bprojections?\b|\bnext\s+(?:month|year|quarter|week)\b|\bwhat\s+will\b|\bestimate\s+future\b").unwrap()
});

static STATISTICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:average|mean|median|mode|std|standard\s+deviation|variance|distribution|statistics?|percentiles?|outliers?|minimum|maximum|highest|lowest|analy[sz]e|analysis|insights?|summari[sz]e|summary)\b").unwrap()
});

static AGGREGATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:sum|total|count|how\s+many|group(?:ed)?\s+by|per|breakdown|aggregate\w*|subtotals?)\b").unwrap()
});

static UI_FORMATTING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:format\w*|bold|italic\w*|underline|font|colou?r|highlight|borders?|currency|align\w*|wrap)\b").unwrap()
});

static UI_FILTERING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bfilter\w*|\bshow\s+only\b|\bonly\s+show\b|\bexclude\b|\bhide\s+rows?\s+where\b").unwrap()
});

static UI_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[a-z]{1,2}\d+\b|\bcells?\b|\bmerge\b|\bunmerge\b").unwrap()
});

static UI_BASIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:sort|order|delete|remove|insert|add|hide|show|unhide|freeze|unfreeze|rename|resize|width|duplicates?|replace|table|columns?|rows?)\b").unwrap()
});

/// One battery member: a query type and its predicate over lower-cased text.
#[derive(Clone, Copy)]
pub struct CategoryRule {
    pub query_type: QueryType,
    pub matches: fn(&str) -> bool,
}

impl fmt::Debug for CategoryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryRule")
            .field("query_type", &self.query_type)
            .finish()
    }
}

/// An imperative spreadsheet command: leads with a UI verb and asks nothing.
/// Analytics nouns inside such a command ("sort by total") name columns or
/// directions, not a request for analysis.
pub fn is_ui_command(text: &str) -> bool {
    starts_with_ui_verb(text) && !QUESTION_FRAMING.is_match(text)
}

pub fn starts_with_ui_verb(text: &str) -> bool {
    LEADING_UI_VERB.is_match(text.trim())
}

fn is_mixed_ui_analytics(text: &str) -> bool {
    extract::has_conjunction(text)
        && UI_VERB.is_match(text)
        && ANALYSIS_WORD.is_match(text)
        && extract::split_sub_commands(text).len() >= 2
}

fn is_mixed_analytics_viz(text: &str) -> bool {
    extract::has_conjunction(text)
        && ANALYSIS_WORD.is_match(text)
        && VIZ_WORD.is_match(text)
        && extract::split_sub_commands(text).len() >= 2
}

fn is_true_compound(text: &str) -> bool {
    if !extract::has_sequence_conjunction(text) {
        return false;
    }
    let operations = extract::extract_operations(text);
    extract::operation_categories(&operations).len() >= 2
        && extract::split_sub_commands(text).len() >= 2
}

/// Comparative language precedes every other analytics or compound check.
/// Analytics categories yield to imperative UI commands.
static CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        query_type: QueryType::AnalyticsComparative,
        matches: |t| COMPARATIVE.is_match(t),
    },
    CategoryRule {
        query_type: QueryType::MixedUiAnalytics,
        matches: is_mixed_ui_analytics,
    },
    CategoryRule {
        query_type: QueryType::MixedAnalyticsViz,
        matches: is_mixed_analytics_viz,
    },
    CategoryRule {
        query_type: QueryType::TrueCompound,
        matches: is_true_compound,
    },
    CategoryRule {
        query_type: QueryType::VisualizationDashboard,
        matches: |t| DASHBOARD.is_match(t),
    },
    CategoryRule {
        query_type: QueryType::VisualizationChart,
        matches: |t| VIZ_WORD.is_match(t),
    },
    CategoryRule {
        query_type: QueryType::AnalyticsCorrelation,
        matches: |t| !is_ui_command(t) && CORRELATION.is_match(t),
    },
    CategoryRule {
        query_type: QueryType::AnalyticsTrend,
        matches: |t| !is_ui_command(t) && TREND.is_match(t),
    },
    CategoryRule {
        query_type: QueryType::AnalyticsPredictive,
        matches: |t| !is_ui_command(t) && PREDICTIVE.is_match(t),
    },
    CategoryRule {
        query_type: QueryType::AnalyticsStatistical,
        matches: |t| !is_ui_command(t) && STATISTICAL.is_match(t),
    },
    CategoryRule {
        query_type: QueryType::AnalyticsAggregation,
        matches: |t| !is_ui_command(t) && AGGREGATION.is_match(t),
    },
    CategoryRule {
        query_type: QueryType::UiFormatting,
        matches: |t| UI_FORMATTING.is_match(t),
    },
    CategoryRule {
        query_type: QueryType::UiFiltering,
        matches: |t| UI_FILTERING.is_match(t),
    },
    CategoryRule {
        query_type: QueryType::UiCellOperations,
        matches: |t| UI_CELL.is_match(t),
    },
    CategoryRule {
        query_type: QueryType::UiBasic,
        matches: |t| UI_BASIC.is_match(t),
    },
];

pub fn category_rules() -> &'static [CategoryRule] {
    CATEGORY_RULES
}

/// First matching category; `Unknown` when none fires.
pub fn classify_query(text: &str) -> QueryType {
    let text = text.trim().to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|rule| (rule.matches)(&text))
        .map(|rule| rule.query_type)
        .unwrap_or(QueryType::Unknown)
}
