/// The fixed, ordered interview script. Question numbers are 1-based
/// indices into this list; the service never sees the texts.
const QUESTIONS: [&str; 5] = [
    "Tell me about yourself.",
    "What interests you about our company?",
    "What is the most challenging model you've deployed and why?",
    "How do you detect and handle data drift in a live ML system?",
    "When would you choose a simpler model over a complex one?",
];

pub fn default_questions() -> Vec<String> {
    QUESTIONS.iter().map(|q| q.to_string()).collect()
}
