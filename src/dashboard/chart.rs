//! Status history chart

use super::types::HistoryEntry;
use crate::i18n::Translations;

const ON: char = '█';
const OFF: char = '▁';

/// Parallel series derived from the history list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartData {
    /// `HH:MM:SS` (UTC) per entry
    pub labels: Vec<String>,
    pub youtube: Vec<u8>,
    pub obs: Vec<u8>,
}

impl ChartData {
    pub fn from_history(entries: &[HistoryEntry]) -> Self {
        let mut data = ChartData {
            labels: Vec::with_capacity(entries.len()),
            youtube: Vec::with_capacity(entries.len()),
            obs: Vec::with_capacity(entries.len()),
        };
        for entry in entries {
            data.labels.push(
                entry
                    .last_check_timestamp
                    .map(|ts| ts.format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "--:--:--".to_string()),
            );
            data.youtube.push(entry.youtube_is_live.series_value());
            data.obs.push(entry.obs_streaming.series_value());
        }
        data
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// The chart object. Built once per session, then updated in place.
#[derive(Debug, Clone)]
pub struct HistoryChart {
    data: ChartData,
    youtube_label: String,
    obs_label: String,
    redraws: u64,
}

impl HistoryChart {
    pub fn new(data: ChartData, translations: &Translations) -> Self {
        let mut chart = Self {
            data,
            youtube_label: String::new(),
            obs_label: String::new(),
            redraws: 0,
        };
        chart.apply_labels(translations);
        chart.redraws = 1;
        chart
    }

    /// Replace the series and request a redraw.
    pub fn update(&mut self, data: ChartData) {
        self.data = data;
        self.request_redraw();
    }

    /// Re-apply dataset labels after a language change.
    pub fn relabel(&mut self, translations: &Translations) {
        self.apply_labels(translations);
        self.request_redraw();
    }

    fn apply_labels(&mut self, translations: &Translations) {
        self.youtube_label = translations.text_or("chart_youtube_live", "YouTube Live");
        self.obs_label = translations.text_or("chart_obs_streaming", "OBS Streaming");
    }

    fn request_redraw(&mut self) {
        self.redraws += 1;
    }

    pub fn data(&self) -> &ChartData {
        &self.data
    }

    pub fn dataset_labels(&self) -> (&str, &str) {
        (&self.youtube_label, &self.obs_label)
    }

    /// Number of draws requested so far, construction included.
    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    /// Two glyph rows over the newest `width` entries plus a time axis.
    pub fn render(&self, width: usize) -> String {
        let total = self.data.len();
        let start = total.saturating_sub(width.max(1));
        let pad = self
            .youtube_label
            .chars()
            .count()
            .max(self.obs_label.chars().count());

        let row = |series: &[u8]| -> String {
            series[start..]
                .iter()
                .map(|v| if *v > 0 { ON } else { OFF })
                .collect()
        };

        let mut out = String::new();
        out.push_str(&format!(
            "{:<pad$}  {}\n",
            self.youtube_label,
            row(&self.data.youtube),
            pad = pad
        ));
        out.push_str(&format!(
            "{:<pad$}  {}\n",
            self.obs_label,
            row(&self.data.obs),
            pad = pad
        ));
        if total > start {
            out.push_str(&format!(
                "{:<pad$}  {} .. {} ({} checks)\n",
                "",
                self.data.labels[start],
                self.data.labels[total - 1],
                total - start,
                pad = pad
            ));
        } else {
            out.push_str(&format!("{:<pad$}  (no history yet)\n", "", pad = pad));
        }
        out
    }
}
