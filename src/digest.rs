use crate::classifier::classify;
use crate::composer::{Prompt, SummaryComposer};
use crate::config::AppConfig;
use crate::email::{EmailDraft, MailError, Mailer};
use crate::formatter::TaskFormatter;
use crate::openai_client::{GenerationError, TextGenerator};
use crate::sheet_parser::{ParsedSheet, SheetParseError, parse_records, parse_rows};
use crate::sheets_client::{SheetSource, SourceError};
use crate::sheets_types::SheetData;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("Failed to fetch tasks: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Parse(#[from] SheetParseError),

    #[error("Failed to generate email: {0}")]
    Generation(#[from] GenerationError),

    #[error("Failed to send email: {0}")]
    Mail(#[from] MailError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addressing {
    pub from: String,
    pub to: String,
    pub subject: String,
}

/// fetch → parse → classify → compose → generate → send, one pass per run.
pub struct DigestPipeline {
    composer: SummaryComposer,
    addressing: Addressing,
}

impl DigestPipeline {
    pub fn new(composer: SummaryComposer, addressing: Addressing) -> Self {
        DigestPipeline { composer, addressing }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let formatter = TaskFormatter::new(config.digest.date_format.clone());
        let composer = SummaryComposer::new(
            formatter,
            config.digest.compose.clone(),
            config.digest.persona.clone(),
        );
        let addressing = Addressing {
            from: config.email.from_email.clone(),
            to: config.email.to_email.clone(),
            subject: config.email.subject.clone(),
        };
        DigestPipeline::new(composer, addressing)
    }

    pub fn compose(&self, data: SheetData, today: NaiveDate) -> Result<Prompt, SheetParseError> {
        let sheet = match data {
            SheetData::Rows(rows) => parse_rows(&rows)?,
            SheetData::Records(records) => parse_records(&records)?,
        };
        let ParsedSheet { records, skipped } = sheet;

        for row in &skipped {
            debug!(row = row.row, issue = ?row.issue, "Skipping sheet row");
        }

        let buckets = classify(records, today);
        let counts = buckets.counts();
        info!(
            %today,
            overdue = counts.overdue,
            due_today = counts.due_today,
            upcoming = counts.upcoming,
            later = counts.later,
            skipped = skipped.len(),
            "Classified tasks"
        );

        let prompt = self.composer.compose(&buckets);
        if prompt.is_empty_day() {
            info!("Nothing outstanding, using the no-tasks prompt");
        }
        Ok(prompt)
    }

    pub async fn prepare(&self, source: &dyn SheetSource, today: NaiveDate) -> Result<Prompt, DigestError> {
        info!(source = %source.describe(), "Fetching tasks");
        let data = source.fetch().await?;
        Ok(self.compose(data, today)?)
    }

    pub async fn draft(&self, generator: &dyn TextGenerator, prompt: &Prompt) -> Result<EmailDraft, DigestError> {
        let body = generator.generate(&prompt.text()).await?;
        debug!(chars = body.len(), "Generated email body");

        Ok(EmailDraft {
            subject: self.addressing.subject.clone(),
            from: self.addressing.from.clone(),
            to: self.addressing.to.clone(),
            body,
        })
    }

    pub fn send(&self, mailer: &dyn Mailer, draft: &EmailDraft) -> Result<(), DigestError> {
        mailer.deliver(draft)?;
        info!(to = %draft.to, "Email sent");
        Ok(())
    }

    pub async fn run(
        &self,
        source: &dyn SheetSource,
        generator: &dyn TextGenerator,
        mailer: &dyn Mailer,
        today: NaiveDate,
    ) -> Result<EmailDraft, DigestError> {
        let prompt = self.prepare(source, today).await?;
        let draft = self.draft(generator, &prompt).await?;
        self.send(mailer, &draft)?;
        Ok(draft)
    }
}
