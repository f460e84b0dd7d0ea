//! The six archetype buckets and their marketing copy.

use serde::Serialize;

/// A classification bucket. Immutable catalog data.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Archetype {
    pub id: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
    pub headline: &'static str,
    pub body: &'static [&'static str],
    pub bullets: &'static [&'static str],
    pub solution: &'static str,
    pub cta: &'static str,
}

pub mod ids {
    pub const CURIOUS_EXPLORER: &str = "curious_explorer";
    pub const OVERWHELMED_STARTER: &str = "overwhelmed_starter";
    pub const DISPLACED_REBUILDER: &str = "displaced_rebuilder";
    pub const PIVOTING_PROFESSIONAL: &str = "pivoting_professional";
    pub const SURVIVAL_FREELANCER: &str = "survival_freelancer";
    pub const EMERGING_FOUNDER: &str = "emerging_founder";
}

static ARCHETYPES: &[Archetype] = &[
    Archetype {
        id: ids::CURIOUS_EXPLORER,
        name: "The Curious Explorer",
        emoji: "🔭",
        headline: "You're Exploring What's Possible — And That's Exactly Where Most Founders Start.",
        body: &[
            "Right now, you're in discovery mode. You're curious about entrepreneurship, but you're still figuring out if it's the right path for you — and that's completely normal.",
            "Most successful founders don't start with certainty. They start with curiosity, skill, and a desire for more control over their future.",
            "Where people like you usually get stuck is:",
        ],
        bullets: &[
            "Too many ideas",
            "Not knowing what's realistic",
            "Consuming information without clear next steps",
        ],
        solution: "NuFounders was built to help people move from learning → testing → earning — without needing to \"go all in\" before you're ready.",
        cta: "The fastest progress usually comes from testing small, low-risk ways to turn skills into real market demand.",
    },
    Archetype {
        id: ids::OVERWHELMED_STARTER,
        name: "The Overwhelmed Starter",
        emoji: "🧩",
        headline: "You're Ready To Start — You Just Need a Clear Path.",
        body: &[
            "You're past curiosity. You want to build something of your own — you just don't want to waste time, money, or energy going in the wrong direction.",
            "Most people in your stage don't fail because they lack ability. They stall because they lack:",
        ],
        bullets: &[
            "Clear sequencing",
            "Offer clarity",
            "Confidence in what will actually sell",
        ],
        solution: "NuFounders helps you go from: Idea → Offer → Customers → Revenue — with built-in marketplace exposure and guided execution.",
        cta: "If you want to see how this could accelerate your first real revenue, early access may be worth exploring.",
    },
    Archetype {
        id: ids::DISPLACED_REBUILDER,
        name: "The Recently Displaced Rebuilder",
        emoji: "🔨",
        headline: "You're Rebuilding — And That Can Become Your Strongest Advantage.",
        body: &[
            "You're not just exploring entrepreneurship. You're looking for stability, control, and a path forward that isn't dependent on employer decisions.",
            "Many strong businesses are started during career transition periods — not despite them, but because of them.",
            "Right now your biggest leverage is:",
        ],
        bullets: &[
            "Existing skills",
            "Speed to market",
            "Focus on real income, not theory",
        ],
        solution: "NuFounders was designed specifically to shorten the path from skills → customers → income through AI matching + marketplace access.",
        cta: "If you're looking for faster ways to turn experience into income, early cohort access could be a strong fit.",
    },
    Archetype {
        id: ids::PIVOTING_PROFESSIONAL,
        name: "The Pivoting Professional",
        emoji: "🧭",
        headline: "You're Positioned To Build Something Real — Not Just Experiment.",
        body: &[
            "You're approaching entrepreneurship intentionally. You're not looking for hype — you're looking for a model that works.",
            "You likely already have:",
        ],
        bullets: &[
            "Marketable expertise",
            "Professional credibility",
            "Real-world problem knowledge",
        ],
        solution: "NuFounders focuses on turning professional skill into scalable revenue opportunities — not just side projects.",
        cta: "If you're serious about building this correctly and efficiently, early access may be worth reviewing.",
    },
    Archetype {
        id: ids::SURVIVAL_FREELANCER,
        name: "The Survival Freelancer",
        emoji: "⚡",
        headline: "You're Already Doing This — Now It's About Consistency and Scale.",
        body: &[
            "You've already crossed the hardest line: You've proven someone will pay you.",
            "Now the challenge usually becomes:",
        ],
        bullets: &[
            "Predictable customer flow",
            "Pricing confidence",
            "Systems that remove chaos",
        ],
        solution: "NuFounders helps freelancers transition into real business owners with customer pipeline support, offer packaging, and marketplace distribution.",
        cta: "If you want to turn inconsistent income into reliable revenue, you may want to explore early cohort access.",
    },
    Archetype {
        id: ids::EMERGING_FOUNDER,
        name: "The Emerging Founder",
        emoji: "👑",
        headline: "You're In Founder Mode — Now It's About Leverage.",
        body: &[
            "You already think like a business owner. Your focus is likely shifting toward:",
        ],
        bullets: &[
            "Scaling revenue",
            "Reducing founder bottlenecks",
            "Increasing leverage through systems and distribution",
        ],
        solution: "NuFounders combines AI-driven opportunity matching with marketplace exposure and founder-level growth tooling.",
        cta: "If you're looking for leverage — not just learning — early access may be a strong fit.",
    },
];

/// All six archetypes.
pub fn archetypes() -> &'static [Archetype] {
    ARCHETYPES
}

/// Look up an archetype by id.
pub fn archetype_by_id(id: &str) -> Option<&'static Archetype> {
    ARCHETYPES.iter().find(|a| a.id == id)
}
