use serde::{Deserialize, Serialize};

pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Sharp spelling of a pitch class (0 = C).
pub fn note_name(pitch_class: u8) -> &'static str {
    NOTE_NAMES[(pitch_class % 12) as usize]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    Major,
    Minor,
}

impl std::fmt::Display for KeyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyMode::Major => write!(f, "major"),
            KeyMode::Minor => write!(f, "minor"),
        }
    }
}

/// A key label without a score: tonic pitch class plus mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    /// Pitch class 0–11 (C=0, C#=1, ...)
    pub tonic: u8,
    pub mode: KeyMode,
}

impl Key {
    pub fn root_name(&self) -> &'static str {
        note_name(self.tonic)
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.root_name(), self.mode)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEstimate {
    pub tonic: u8,
    pub mode: KeyMode,
    /// Pearson correlation with the best-matching key profile, not a probability
    pub confidence: f64,
}

impl KeyEstimate {
    /// Result for a profile with no usable energy.
    pub fn silent() -> Self {
        Self {
            tonic: 0,
            mode: KeyMode::Major,
            confidence: 0.0,
        }
    }

    pub fn key(&self) -> Key {
        Key {
            tonic: self.tonic,
            mode: self.mode,
        }
    }
}

impl std::fmt::Display for KeyEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.key().fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Suspended2,
    Suspended4,
    Major7,
    Minor7,
    Dominant7,
    Diminished7,
    Major9,
    Minor9,
    Add9,
    Minor6,
    Major6,
}

impl ChordQuality {
    /// Catalog order; ties between equally scored chords go to the earlier entry.
    pub const ALL: [ChordQuality; 15] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Diminished,
        ChordQuality::Augmented,
        ChordQuality::Suspended2,
        ChordQuality::Suspended4,
        ChordQuality::Major7,
        ChordQuality::Minor7,
        ChordQuality::Dominant7,
        ChordQuality::Diminished7,
        ChordQuality::Major9,
        ChordQuality::Minor9,
        ChordQuality::Add9,
        ChordQuality::Minor6,
        ChordQuality::Major6,
    ];

    /// Suffix for chord symbol display
    pub fn suffix(&self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::Suspended2 => "sus2",
            ChordQuality::Suspended4 => "sus4",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Minor7 => "m7",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Diminished7 => "dim7",
            ChordQuality::Major9 => "maj9",
            ChordQuality::Minor9 => "m9",
            ChordQuality::Add9 => "add9",
            ChordQuality::Minor6 => "m6",
            ChordQuality::Major6 => "6",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordEstimate {
    pub root: u8,
    /// `None` means no chord: a silent or featureless frame
    pub quality: Option<ChordQuality>,
    /// Weighted correlation with the winning template
    pub confidence: f64,
}

impl ChordEstimate {
    pub fn none() -> Self {
        Self {
            root: 0,
            quality: None,
            confidence: 0.0,
        }
    }

    /// Full chord symbol: "C", "Am", "G7"
    pub fn symbol(&self) -> Option<String> {
        self.quality
            .map(|q| format!("{}{}", note_name(self.root), q.suffix()))
    }
}

/// One analysis window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start_time: f64,
    pub end_time: f64,
    pub key: KeyEstimate,
    /// Chord symbols, strongest first
    pub chords: Vec<String>,
    /// 1.0 = pitch content constant across the window
    pub stability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyChangeEvent {
    /// Start of the segment where the new key was detected
    pub time: f64,
    pub from_key: Key,
    pub to_key: Key,
    pub confidence_delta: f64,
}

/// Display names handed out to clusters in order of their id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionLabel {
    Intro,
    Verse,
    Chorus,
    Bridge,
}

impl SectionLabel {
    pub const CYCLE: [SectionLabel; 4] = [
        SectionLabel::Intro,
        SectionLabel::Verse,
        SectionLabel::Chorus,
        SectionLabel::Bridge,
    ];

    /// Name for an opaque cluster id. Carries no claim about song form.
    pub fn for_cluster(cluster_id: usize) -> Self {
        Self::CYCLE[cluster_id % Self::CYCLE.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub label: SectionLabel,
    pub start_time: f64,
    pub cluster_id: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureAnalysis {
    pub sections: Vec<Section>,
    pub n_sections: usize,
    /// Mean of all centroid coordinates; uncalibrated
    pub structure_confidence: f64,
}

impl StructureAnalysis {
    pub fn empty() -> Self {
        Self {
            sections: Vec::new(),
            n_sections: 0,
            structure_confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressionKind {
    #[serde(rename = "I-IV")]
    OneFour,
    #[serde(rename = "I-V")]
    OneFive,
    #[serde(rename = "vi-IV")]
    SixFour,
    #[serde(rename = "IV-V")]
    FourFive,
    #[serde(rename = "V-I")]
    FiveOne,
    #[serde(rename = "vi-I")]
    SixOne,
    #[serde(rename = "custom")]
    Custom,
}

impl ProgressionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ProgressionKind::OneFour => "I-IV",
            ProgressionKind::OneFive => "I-V",
            ProgressionKind::SixFour => "vi-IV",
            ProgressionKind::FourFive => "IV-V",
            ProgressionKind::FiveOne => "V-I",
            ProgressionKind::SixOne => "vi-I",
            ProgressionKind::Custom => "custom",
        }
    }
}

impl std::fmt::Display for ProgressionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionLink {
    pub start_time: f64,
    pub end_time: f64,
    pub from_chords: Vec<String>,
    pub to_chords: Vec<String>,
    pub progression_type: ProgressionKind,
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Algorithm version
    pub version: u32,
    pub duration_seconds: f64,
    /// Derived from the supplied beat list, if any
    pub tempo_bpm: Option<f64>,
    pub global_key: KeyEstimate,
    pub global_chords: Vec<String>,
    pub segments: Vec<Segment>,
    pub key_changes: Vec<KeyChangeEvent>,
    pub structure: StructureAnalysis,
    pub progressions: Vec<ProgressionLink>,
    /// Diatonic progression templates spelled in the global key
    pub suggested_progressions: Vec<Vec<String>>,
}
