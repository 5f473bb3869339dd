use time::OffsetDateTime;

pub trait TimeProvider: Clone + Send + Sync + 'static {
    fn now(&self) -> OffsetDateTime;

    /// Current UTC calendar date as `YYYY-MM-DD`.
    fn today(&self) -> String {
        let date = self.now().to_offset(time::UtcOffset::UTC).date();
        format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            u8::from(date.month()),
            date.day()
        )
    }
}
