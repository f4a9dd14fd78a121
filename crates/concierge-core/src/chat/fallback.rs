//! Local replies used when the text-generation service fails

use rand::seq::SliceRandom;

const SERVICES_REPLY: &str = "Of course! We specialize in AI-driven health insights and digital wellbeing tools. Our services include virtual consultations, diagnostic analysis, and personalized care plans.";
const BOOKING_REPLY: &str = "I'd be happy to help you schedule an appointment. Our virtual consultations are available 24/7. Would you like to book one now?";
const GREETING_REPLY: &str = "Hello! It's great to see you. What can I help you with today?";
const THANKS_REPLY: &str = "You're very welcome! Is there anything else I can help you with?";
const SYMPTOMS_REPLY: &str = "I'm sorry to hear you're not feeling well. Could you describe your symptoms in more detail? This will help me provide better guidance.";

/// Replies for messages that match no rule
pub const CANNED_REPLIES: [&str; 8] = [
    "I understand. Let me help you with that. Can you provide more details?",
    "That's a great question! Based on your symptoms, I'd recommend scheduling a consultation.",
    "Of course! We specialize in AI-driven health insights and digital wellbeing tools.",
    "Thank you for sharing that information. It's important to monitor these symptoms closely.",
    "I'm here to help. Our clinic offers comprehensive diagnostic services and personalized care plans.",
    "That sounds concerning. I'd recommend getting that checked by one of our specialists.",
    "Absolutely! We provide 24/7 virtual consultations and can connect you with the right healthcare professional.",
    "Based on what you've told me, here are some recommendations you might find helpful.",
];

/// Picks a canned reply from simple keyword rules
///
/// Rules are checked in order; the first match wins. Greetings must be whole
/// words, the other rules match anywhere in the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackResponder;

impl FallbackResponder {
    pub fn new() -> Self {
        Self
    }

    /// Reply chosen by rule, or `None` when no rule applies
    pub fn rule_reply(&self, message: &str) -> Option<&'static str> {
        let lower = message.to_lowercase();
        let contains_any = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));
        let has_word = |words: &[&str]| {
            lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|w| words.contains(&w))
        };

        if contains_any(&["service", "offer"]) {
            Some(SERVICES_REPLY)
        } else if contains_any(&["appointment", "schedule"]) {
            Some(BOOKING_REPLY)
        } else if has_word(&["hello", "hi"]) {
            Some(GREETING_REPLY)
        } else if contains_any(&["thank"]) {
            Some(THANKS_REPLY)
        } else if contains_any(&["pain", "hurt", "sick"]) {
            Some(SYMPTOMS_REPLY)
        } else {
            None
        }
    }

    /// Reply for `message`, falling back to a random canned reply
    pub fn reply(&self, message: &str) -> &'static str {
        self.rule_reply(message).unwrap_or_else(|| {
            CANNED_REPLIES
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(CANNED_REPLIES[0])
        })
    }
}
