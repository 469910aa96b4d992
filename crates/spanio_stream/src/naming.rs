//! Segment identifier generation.

/// Maps segment sequence numbers to identifiers of the form
/// `{prefix}{sequence:0width}{suffix}`.
///
/// The default scheme produces `00000000.data`, `00000001.data`, ...
/// Identifiers sort lexicographically in sequence order as long as the
/// sequence fits in `width` digits.
///
/// # Example
///
/// ```rust
/// use spanio_stream::SegmentNaming;
///
/// let naming = SegmentNaming::new("wal-", 4, ".log");
/// assert_eq!(naming.format(7), "wal-0007.log");
/// assert_eq!(naming.parse("wal-0007.log"), Some(7));
/// assert_eq!(naming.parse("other.log"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentNaming {
    prefix: String,
    width: usize,
    suffix: String,
}

impl Default for SegmentNaming {
    fn default() -> Self {
        Self::new("", 8, ".data")
    }
}

impl SegmentNaming {
    /// Creates a naming scheme.
    #[must_use]
    pub fn new(prefix: impl Into<String>, width: usize, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            width,
            suffix: suffix.into(),
        }
    }

    /// Returns the identifier prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the zero-padded width of the sequence number.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the identifier suffix.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Formats the identifier for `sequence`.
    #[must_use]
    pub fn format(&self, sequence: u64) -> String {
        format!(
            "{}{:0width$}{}",
            self.prefix,
            sequence,
            self.suffix,
            width = self.width
        )
    }

    /// Extracts the sequence number from an identifier produced by this scheme.
    ///
    /// Returns `None` unless `id` is exactly what [`SegmentNaming::format`]
    /// produces for some sequence number.
    #[must_use]
    pub fn parse(&self, id: &str) -> Option<u64> {
        let digits = id
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let sequence = digits.parse().ok()?;
        // Each sequence has exactly one identifier; extra padding is foreign.
        (self.format(sequence) == id).then_some(sequence)
    }

    /// Returns a generator closure suitable for [`crate::SpanWriter::new`].
    #[must_use]
    pub fn generator(&self) -> impl Fn(u64) -> String + Send + 'static {
        let naming = self.clone();
        move |sequence| naming.format(sequence)
    }
}
