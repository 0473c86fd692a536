/// Structured fields pulled out of a letter's free text.
///
/// Every field is best-effort and independently absent; a letter with no
/// recognizable identifier, date or salutation is still a valid letter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LetterFields {
    /// Labeled numeric token (e.g. an NHS number), digits only after
    /// normalization.
    pub identifier: Option<String>,
    /// Letter date normalized to `YYYY-MM-DD`.
    pub letter_date: Option<String>,
    /// Free text from the first salutation marker to end of document.
    pub body: Option<String>,
}
