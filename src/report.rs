//! Report Record and Assembler.
//!
//! The record mirrors the webview form. `format_report` renders the fixed
//! chat-ready text block; `FormState` adds the round-inspection preset.

use crate::config::RoundConfig;
use crate::digitizer::ImageArtifact;
use crate::errors::ReportError;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

pub const STAGE_BEFORE: &str = "antes";
pub const STAGE_DURING: &str = "durante";
pub const STAGE_AFTER: &str = "depois";

pub const DEFAULT_DESCRIPTION: &str = "Sem descrição";

/// Checklist text filled in by the round-inspection preset
pub const ROUND_CHECKLIST: &str = "✅ *Inspeção técnica de infraestrutura:* Concluída a ronda operacional em todas as instalações sanitárias.
📋 *Checklist de verificação:*

- Louças: Condições de conservação e higiene.

- Acessos: Funcionamento de portas e trincos.

- Hidráulica: Sistemas de descarga e fluxo de água.
";

/// Human label for a stage code; unknown codes pass through
pub fn stage_label(code: &str) -> &str {
    match code {
        STAGE_BEFORE => "ANTES",
        STAGE_DURING => "DURANTE",
        STAGE_AFTER => "DEPOIS",
        other => other,
    }
}

/// Human label for an area code; unknown codes pass through
pub fn area_label(code: &str) -> &str {
    match code {
        "terreo" => "Térreo",
        "pav1" => "1° Pavimento",
        "pav2" => "2° Pavimento",
        "pav3" => "3° Pavimento",
        "pav4" => "4° Pavimento",
        "pav5" => "5° Pavimento",
        "externa" => "Área Externa",
        "telhado" => "Telhado",
        other => other,
    }
}

/// One service report. Empty strings mean "not filled in".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportRecord {
    pub company: String,
    pub requester: String,
    pub worker: String,
    pub stage: String,
    pub area: String,
    pub location: String,
    pub description: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(skip)]
    pub photo: Option<ImageArtifact>,
}

impl ReportRecord {
    pub fn ready_for_submission(&self) -> Result<&ImageArtifact, ReportError> {
        self.photo.as_ref().ok_or(ReportError::MissingPhoto)
    }

    pub fn is_completed(&self) -> bool {
        self.stage == STAGE_AFTER
    }

    /// `antes` stamps the start time, `depois` the end time
    pub fn stamp_times(&mut self, now: NaiveTime) {
        let stamp = now.format("%H:%M").to_string();
        match self.stage.as_str() {
            STAGE_BEFORE => {
                log::debug!("Start time stamped: {}", stamp);
                self.start_time = stamp;
            }
            STAGE_AFTER => {
                log::debug!("End time stamped: {}", stamp);
                self.end_time = stamp;
            }
            _ => {}
        }
    }

    /// Replace the text fields, keeping the attached photo
    pub fn update_fields(&mut self, fields: ReportRecord) {
        let photo = self.photo.take();
        *self = ReportRecord { photo, ..fields };
    }
}

fn present(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Render the report text. Blank optional lines are left out entirely.
pub fn format_report(record: &ReportRecord, date: NaiveDate) -> String {
    let mut lines = vec![
        "🔧 *RELATÓRIO DE SERVIÇO*".to_string(),
        String::new(),
        format!("*ETAPA:* {}", stage_label(&record.stage)),
        String::new(),
        format!("*EMPRESA:* {}", record.company),
        format!("*SOLICITANTE:* {}", record.requester),
        format!("*FUNCIONÁRIO:* {}", record.worker),
        format!("*ÁREA:* {}", area_label(&record.area)),
    ];
    if let Some(location) = present(&record.location) {
        lines.push(format!("*LOCAL:* {}", location));
    }
    lines.push("*DESCRIÇÃO:*".to_string());
    lines.push(
        present(&record.description)
            .unwrap_or(DEFAULT_DESCRIPTION)
            .to_string(),
    );
    lines.push(String::new());
    if let Some(start) = present(&record.start_time) {
        lines.push(format!("*HORA INÍCIO:* {}", start));
    }
    if let Some(end) = present(&record.end_time) {
        lines.push(format!("*HORA TÉRMINO:* {}", end));
    }
    lines.push(format!("*DATA:* {}", date.format("%d/%m/%Y")));
    lines.push(String::new());

    let status = if record.is_completed() {
        "CONCLUÍDO"
    } else {
        "EM ANDAMENTO"
    };
    lines.push(format!("✅ *STATUS:* {}", status));

    lines.join("\n")
}

/// Form fields plus the round-inspection toggle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    record: ReportRecord,
    round: bool,
    custom_round_text: Option<String>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> &ReportRecord {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut ReportRecord {
        &mut self.record
    }

    pub fn is_round(&self) -> bool {
        self.round
    }

    pub fn update_fields(&mut self, fields: ReportRecord) {
        if self.round && fields.description != ROUND_CHECKLIST {
            self.remember_round_text(&fields.description);
        }
        self.record.update_fields(fields);
    }

    fn remember_round_text(&mut self, text: &str) {
        if text.trim().is_empty() || text == ROUND_CHECKLIST {
            return;
        }
        self.custom_round_text = Some(text.to_string());
        log::debug!("Custom round text saved");
    }

    /// Switch the round-inspection preset on or off
    pub fn set_round(&mut self, enabled: bool, preset: &RoundConfig) {
        if enabled {
            self.record.description = self
                .custom_round_text
                .clone()
                .unwrap_or_else(|| ROUND_CHECKLIST.to_string());
            if let Some(requester) = &preset.requester {
                self.record.requester = requester.clone();
            }
            self.record.area = preset.area.clone();
            self.record.stage = preset.stage.clone();
            self.record.location = preset.location.clone();
            log::info!("Round inspection: on");
        } else {
            let current = self.record.description.clone();
            self.remember_round_text(&current);
            self.record.description.clear();
            self.record.location.clear();
            self.record.stage.clear();
            self.record.requester.clear();
            self.record.area.clear();
            log::info!("Round inspection: off");
        }
        self.round = enabled;
    }

    pub fn attach_photo(&mut self, artifact: ImageArtifact) {
        self.record.photo = Some(artifact);
    }

    pub fn take_photo(&mut self) -> Option<ImageArtifact> {
        self.record.photo.take()
    }

    pub fn has_photo(&self) -> bool {
        self.record.photo.is_some()
    }
}
