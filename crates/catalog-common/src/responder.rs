/// Keyword-triggered canned replies for the site's chat widget.
///
/// Rules are tried in declaration order; the first rule with any keyword present in
/// the lowercased message wins. When nothing matches, one of the fallback replies is
/// picked uniformly at random from the caller's RNG.
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct ReplyRule {
    /// Lowercase substrings that trigger this rule.
    pub keywords: Vec<String>,
    pub reply: String,
}

impl ReplyRule {
    pub fn new(keywords: &[&str], reply: impl Into<String>) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            reply: reply.into(),
        }
    }

    fn matches(&self, normalized: &str) -> bool {
        self.keywords.iter().any(|k| normalized.contains(k.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct CannedResponder {
    rules: Vec<ReplyRule>,
    fallbacks: Vec<String>,
}

impl CannedResponder {
    pub fn new(rules: Vec<ReplyRule>, fallbacks: Vec<String>) -> Self {
        Self { rules, fallbacks }
    }

    pub fn rules(&self) -> &[ReplyRule] {
        &self.rules
    }

    /// The first matching rule's reply, if any rule matches.
    pub fn matched_reply(&self, message: &str) -> Option<&str> {
        let normalized = message.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&normalized))
            .map(|rule| rule.reply.as_str())
    }

    pub fn reply<R: Rng + ?Sized>(&self, message: &str, rng: &mut R) -> &str {
        match self.matched_reply(message) {
            Some(reply) => reply,
            None => self.fallback(rng),
        }
    }

    /// A random fallback reply, for messages no rule matched.
    pub fn fallback<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        self.fallbacks
            .choose(rng)
            .map(String::as_str)
            .unwrap_or(DEFAULT_FALLBACK)
    }
}

const DEFAULT_FALLBACK: &str =
    "Thanks for your message! Our team will get back to you shortly on WhatsApp.";

impl Default for CannedResponder {
    fn default() -> Self {
        let rules = vec![
            ReplyRule::new(
                &["hello", "hi ", "salam", "assalam", "aoa"],
                "Assalam-o-Alaikum! How can we help with your AC today? Ask about installation, \
                 repair, gas refilling, or buying and selling units.",
            ),
            ReplyRule::new(
                &["price", "cost", "rate", "charges", "kitna"],
                "Service charges depend on the job: general service starts from Rs. 2,500, \
                 installation from Rs. 4,000, and gas refilling from Rs. 6,000. Send us your \
                 AC model for an exact quote.",
            ),
            ReplyRule::new(
                &["install", "fitting", "shift"],
                "We install and shift split, window, and inverter ACs of every brand. A \
                 technician can usually visit within 24 hours.",
            ),
            ReplyRule::new(
                &["gas", "refill", "cooling"],
                "Weak cooling is usually low gas or a dirty coil. We do leak testing and gas \
                 refilling (R22, R410A, R32) on site.",
            ),
            ReplyRule::new(
                &["repair", "service", "fix", "not working", "noise", "leak"],
                "Our technicians repair PCBs, compressors, fan motors, and water leakage \
                 issues. Book a visit and we will diagnose it at your place.",
            ),
            ReplyRule::new(
                &["sell", "buy", "used", "second hand", "marketplace"],
                "Check our marketplace to buy a used AC or post a 'wanted' request. You can \
                 also list your own unit for sale.",
            ),
            ReplyRule::new(
                &["where", "location", "area", "city", "address"],
                "We cover Lahore and surrounding areas. Share your location and we will \
                 confirm availability.",
            ),
            ReplyRule::new(
                &["time", "timing", "open", "hours", "sunday"],
                "We are available Monday to Saturday, 9am to 9pm. Emergency visits can be \
                 arranged on Sundays.",
            ),
            ReplyRule::new(
                &["contact", "call", "number", "whatsapp", "phone"],
                "You can reach us directly on WhatsApp using the chat button, and we usually \
                 reply within minutes.",
            ),
            ReplyRule::new(
                &["thank", "shukriya", "thx"],
                "You're welcome! Stay cool.",
            ),
        ];

        let fallbacks = vec![
            DEFAULT_FALLBACK.to_string(),
            "I'm not sure I understood. Could you tell us your AC brand and the problem?"
                .to_string(),
            "Our team can answer that best. Tap the WhatsApp button to chat with a \
             technician."
                .to_string(),
        ];

        Self::new(rules, fallbacks)
    }
}
