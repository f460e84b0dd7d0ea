//! The ordered question catalog.
//!
//! Question ids are stable keys: answers, analytics events, and the
//! classifier all reference them. Reordering entries changes navigation;
//! renaming ids breaks stored sessions.

use serde::Serialize;

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    /// Exactly one option.
    Single,
    /// Up to `max_selections` options, order of selection preserved.
    Multi,
    /// Single option from a long searchable list.
    Dropdown,
    /// Single option; some options additionally require an email address,
    /// stored under the `<id>_email` sidecar key.
    EmailConditional,
}

/// One selectable option.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

const fn choice(value: &'static str, label: &'static str) -> Choice {
    Choice { value, label }
}

/// A static catalog entry.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub prompt: &'static str,
    pub kind: QuestionKind,
    pub section: &'static str,
    pub options: &'static [Choice],
    /// Multi-choice cap. Selecting beyond it is a no-op.
    pub max_selections: Option<usize>,
    /// Option values that require an email under `<id>_email`.
    pub email_required_options: &'static [&'static str],
    /// Option value that requires free text under `<id>_other`.
    pub other_option: Option<&'static str>,
}

impl Question {
    /// Look up the display label for one of this question's option values.
    pub fn label_for(&self, value: &str) -> Option<&'static str> {
        self.options.iter().find(|c| c.value == value).map(|c| c.label)
    }
}

const fn question(
    id: &'static str,
    prompt: &'static str,
    kind: QuestionKind,
    section: &'static str,
    options: &'static [Choice],
) -> Question {
    Question {
        id,
        prompt,
        kind,
        section,
        options,
        max_selections: None,
        email_required_options: &[],
        other_option: None,
    }
}

static EMPLOYMENT_STATUS: &[Choice] = &[
    choice("employed_full_time", "Employed full-time"),
    choice("contracted", "Contracted"),
    choice("employed_itching", "Employed but eager to start a business"),
    choice("laid_off_year", "Laid off within the past year"),
    choice("self_employed", "Self-employed"),
    choice("other", "Other"),
];

static CONSIDERING_BUSINESS: &[Choice] = &[
    choice("exploring_only", "Just exploring the idea"),
    choice("interested_unclear", "Interested but unclear on direction"),
    choice("actively_exploring", "Actively exploring ideas"),
    choice("building_intentionally", "Building something intentionally"),
    choice("operating_growing", "Operating and growing a business"),
    choice("not_pursuing", "Not pursuing a business right now"),
];

static INCOME_URGENCY: &[Choice] = &[
    choice("asap", "As soon as possible"),
    choice("1_3_months", "Within 1-3 months"),
    choice("3_6_months", "Within 3-6 months"),
    choice("about_a_year", "Within about a year"),
    choice("exploring", "Exploring, no urgency"),
    choice("not_income_driven", "Purpose-driven, not income-focused"),
];

static MOTIVATION: &[Choice] = &[
    choice("immediate_financial", "Financial stability"),
    choice("lifestyle_flexibility", "Lifestyle flexibility"),
    choice("career_security", "Career security"),
    choice("limited_opportunities", "Limited job opportunities"),
    choice("purpose_impact", "Purpose and impact"),
    choice("wealth_scaling", "Wealth building"),
];

static BIGGEST_BARRIER: &[Choice] = &[
    choice("choosing_idea", "Choosing the right idea"),
    choice("finding_customers", "Finding customers"),
    choice("business_setup", "Business setup and operations"),
    choice("confidence_risk", "Confidence and risk"),
    choice("capacity_support", "Capacity and support"),
    choice("financial_runway", "Financial runway"),
];

static INCOME_GOAL: &[Choice] = &[
    choice("first_customers", "Getting first paying customers"),
    choice("500_1500", "$500-$1,500/month"),
    choice("1500_3500", "$1,500-$3,500/month"),
    choice("3500_7000", "$3,500-$7,000/month"),
    choice("7000_12000", "$7,000-$12,000/month"),
    choice("replace_prior", "Replacing full prior income"),
];

static SUPPORT_TYPES: &[Choice] = &[
    choice("step_by_step_roadmap", "A step-by-step roadmap"),
    choice("coaching_mentorship", "Coaching and mentorship"),
    choice("customer_pipeline", "Help finding customers"),
    choice("funding_access", "Access to funding"),
    choice("community_peers", "A community of peers"),
    choice("tools_templates", "Tools and templates"),
];

static PLATFORM_HELPFULNESS: &[Choice] = &[
    choice("very_helpful", "Very helpful"),
    choice("somewhat_helpful", "Somewhat helpful"),
    choice("not_sure", "Not sure yet"),
    choice("not_helpful", "Probably not helpful"),
];

static EARLY_ACCESS: &[Choice] = &[
    choice("yes_apply", "Yes — I want to apply"),
    choice("yes_learn_more", "Yes — send me more information"),
    choice("maybe_later", "Maybe later"),
    choice("not_now", "Not right now"),
];

static AGE_RANGE: &[Choice] = &[
    choice("18_24", "18-24"),
    choice("25_34", "25-34"),
    choice("35_44", "35-44"),
    choice("45_54", "45-54"),
    choice("55_64", "55-64"),
    choice("65_plus", "65+"),
];

static EDUCATION: &[Choice] = &[
    choice("high_school", "High school"),
    choice("some_college", "Some college"),
    choice("associates", "Associate degree"),
    choice("bachelors", "Bachelor's degree"),
    choice("masters", "Master's degree"),
    choice("doctorate", "Doctorate"),
];

static INDUSTRY: &[Choice] = &[
    choice("technology", "Technology"),
    choice("healthcare", "Healthcare"),
    choice("finance", "Finance"),
    choice("education", "Education"),
    choice("retail", "Retail"),
    choice("manufacturing", "Manufacturing"),
    choice("media_marketing", "Media & Marketing"),
    choice("hospitality", "Hospitality"),
    choice("government", "Government"),
    choice("nonprofit", "Nonprofit"),
    choice("construction", "Construction"),
    choice("other", "Other"),
];

static EXPERIENCE_YEARS: &[Choice] = &[
    choice("0_2", "0-2 years"),
    choice("3_5", "3-5 years"),
    choice("6_10", "6-10 years"),
    choice("11_20", "11-20 years"),
    choice("20_plus", "20+ years"),
];

static STATE: &[Choice] = &[
    choice("AL", "Alabama"),
    choice("AK", "Alaska"),
    choice("AZ", "Arizona"),
    choice("AR", "Arkansas"),
    choice("CA", "California"),
    choice("CO", "Colorado"),
    choice("CT", "Connecticut"),
    choice("DE", "Delaware"),
    choice("FL", "Florida"),
    choice("GA", "Georgia"),
    choice("HI", "Hawaii"),
    choice("ID", "Idaho"),
    choice("IL", "Illinois"),
    choice("IN", "Indiana"),
    choice("IA", "Iowa"),
    choice("KS", "Kansas"),
    choice("KY", "Kentucky"),
    choice("LA", "Louisiana"),
    choice("ME", "Maine"),
    choice("MD", "Maryland"),
    choice("MA", "Massachusetts"),
    choice("MI", "Michigan"),
    choice("MN", "Minnesota"),
    choice("MS", "Mississippi"),
    choice("MO", "Missouri"),
    choice("MT", "Montana"),
    choice("NE", "Nebraska"),
    choice("NV", "Nevada"),
    choice("NH", "New Hampshire"),
    choice("NJ", "New Jersey"),
    choice("NM", "New Mexico"),
    choice("NY", "New York"),
    choice("NC", "North Carolina"),
    choice("ND", "North Dakota"),
    choice("OH", "Ohio"),
    choice("OK", "Oklahoma"),
    choice("OR", "Oregon"),
    choice("PA", "Pennsylvania"),
    choice("RI", "Rhode Island"),
    choice("SC", "South Carolina"),
    choice("SD", "South Dakota"),
    choice("TN", "Tennessee"),
    choice("TX", "Texas"),
    choice("UT", "Utah"),
    choice("VT", "Vermont"),
    choice("VA", "Virginia"),
    choice("WA", "Washington"),
    choice("WV", "West Virginia"),
    choice("WI", "Wisconsin"),
    choice("WY", "Wyoming"),
    choice("DC", "District of Columbia"),
    choice("other", "Outside the US"),
];

static PRIOR_INCOME: &[Choice] = &[
    choice("under_30k", "Under $30k"),
    choice("30_60k", "$30k-$60k"),
    choice("60_100k", "$60k-$100k"),
    choice("100_150k", "$100k-$150k"),
    choice("150k_plus", "$150k+"),
    choice("prefer_not_say", "Prefer not to say"),
];

static QUESTIONS: &[Question] = &[
    Question {
        id: "employment_status",
        prompt: "What best describes your current employment situation?",
        kind: QuestionKind::Single,
        section: "About You",
        options: EMPLOYMENT_STATUS,
        max_selections: None,
        email_required_options: &[],
        other_option: Some("other"),
    },
    question(
        "considering_business",
        "Where are you with starting your own business?",
        QuestionKind::Single,
        "Business Intent",
        CONSIDERING_BUSINESS,
    ),
    question(
        "income_urgency",
        "How soon do you need your business to generate income?",
        QuestionKind::Single,
        "Business Intent",
        INCOME_URGENCY,
    ),
    question(
        "motivation",
        "What's your primary motivation for starting a business?",
        QuestionKind::Single,
        "Business Intent",
        MOTIVATION,
    ),
    question(
        "biggest_barrier",
        "What's the biggest barrier holding you back?",
        QuestionKind::Single,
        "Business Intent",
        BIGGEST_BARRIER,
    ),
    question(
        "income_goal",
        "What monthly income would make this worthwhile?",
        QuestionKind::Single,
        "Goals",
        INCOME_GOAL,
    ),
    Question {
        id: "support_types",
        prompt: "What kinds of support would help you most? (pick up to 3)",
        kind: QuestionKind::Multi,
        section: "Support",
        options: SUPPORT_TYPES,
        max_selections: Some(3),
        email_required_options: &[],
        other_option: None,
    },
    question(
        "platform_helpfulness",
        "How helpful would a guided platform be for your journey?",
        QuestionKind::Single,
        "Support",
        PLATFORM_HELPFULNESS,
    ),
    Question {
        id: "early_access",
        prompt: "Would you like early access to the platform?",
        kind: QuestionKind::EmailConditional,
        section: "Support",
        options: EARLY_ACCESS,
        max_selections: None,
        email_required_options: &["yes_apply", "yes_learn_more", "maybe_later"],
        other_option: None,
    },
    question(
        "age_range",
        "What's your age range?",
        QuestionKind::Single,
        "Background",
        AGE_RANGE,
    ),
    question(
        "education",
        "What's your highest level of education?",
        QuestionKind::Single,
        "Background",
        EDUCATION,
    ),
    question(
        "industry",
        "What industry is your background in?",
        QuestionKind::Dropdown,
        "Background",
        INDUSTRY,
    ),
    question(
        "experience_years",
        "How many years of professional experience do you have?",
        QuestionKind::Single,
        "Background",
        EXPERIENCE_YEARS,
    ),
    question(
        "state",
        "Where are you located?",
        QuestionKind::Dropdown,
        "Background",
        STATE,
    ),
    question(
        "prior_income",
        "What was your most recent annual income?",
        QuestionKind::Single,
        "Background",
        PRIOR_INCOME,
    ),
];

/// The full ordered catalog.
pub fn questions() -> &'static [Question] {
    QUESTIONS
}

/// Find a question by id.
pub fn question_by_id(id: &str) -> Option<&'static Question> {
    QUESTIONS.iter().find(|q| q.id == id)
}

/// Find a question's index in the catalog.
pub fn question_index(id: &str) -> Option<usize> {
    QUESTIONS.iter().position(|q| q.id == id)
}
