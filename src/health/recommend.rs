// pwvault - Password improvement recommendations
//
// Generic advice shown when a weak password has no more specific feedback.

pub fn default_recommendations() -> Vec<&'static str> {
    vec![
        "Increase password length to 16+ characters",
        "Mix uppercase, lowercase, numbers, and special characters",
        "Avoid common words or predictable sequences",
        "Avoid using personal information (names, birthdates)",
        "Use a passphrase with random words for better memorability",
        "Avoid keyboard patterns (qwerty, asdfgh, etc.)",
        "Consider using a password manager to generate and store strong passwords",
    ]
}
