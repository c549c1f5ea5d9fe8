use crate::classifier::{BucketCounts, BucketKind, Buckets};
use crate::formatter::{Rendering, TaskFormatter};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Persona {
    pub assistant_name: String,
    pub owner_name: String,
}

impl Default for Persona {
    fn default() -> Self {
        Persona {
            assistant_name: "Pixel".to_string(),
            owner_name: "Amy".to_string(),
        }
    }
}

/// Which buckets make it into the prompt and how each one is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    pub include_later: bool,
    pub overdue: Rendering,
    pub due_today: Rendering,
    pub upcoming: Rendering,
    pub later: Rendering,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        ComposeOptions {
            include_later: true,
            overdue: Rendering::Itemized,
            due_today: Rendering::Itemized,
            upcoming: Rendering::Itemized,
            later: Rendering::Summary,
        }
    }
}

impl ComposeOptions {
    pub fn rendering(&self, kind: BucketKind) -> Rendering {
        match kind {
            BucketKind::Overdue => self.overdue,
            BucketKind::DueToday => self.due_today,
            BucketKind::Upcoming => self.upcoming,
            BucketKind::Later => self.later,
        }
    }

    fn reported_kinds(&self) -> Vec<BucketKind> {
        BucketKind::ALL
            .into_iter()
            .filter(|kind| self.include_later || *kind != BucketKind::Later)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: BucketKind,
    pub count: usize,
    pub body: String,
}

impl Section {
    fn heading(&self) -> String {
        let title = match self.kind {
            BucketKind::Overdue => "🟥 Overdue Tasks",
            BucketKind::DueToday => "🟩 Tasks Due Today",
            BucketKind::Upcoming => "📅 Upcoming (next 3 days)",
            BucketKind::Later => "🗓️ Later",
        };
        format!("{} ({}):", title, self.count)
    }
}

/// The two instruction shapes the generator can receive. With nothing to
/// report the generator gets no sections at all, only a greeting request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptVariant {
    NoTasks,
    Itemized(Vec<Section>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub summary_line: String,
    pub variant: PromptVariant,
    persona: Persona,
}

impl Prompt {
    pub fn is_empty_day(&self) -> bool {
        matches!(self.variant, PromptVariant::NoTasks)
    }

    pub fn text(&self) -> String {
        let Persona { assistant_name, owner_name } = &self.persona;
        let intro = format!(
            "You are \"{}\", {}'s AI personal assistant.",
            assistant_name, owner_name
        );

        match &self.variant {
            PromptVariant::NoTasks => format!(
                "{intro}\n\n\
                 Write a short, warm email to {owner_name}. There are no outstanding tasks to report today.\n\n\
                 Include only a light greeting and a single uplifting quote or affirmation.\n\
                 Do not mention, invent, or suggest any tasks.\n\n\
                 Sign off as {assistant_name}.\n"
            ),
            PromptVariant::Itemized(sections) => {
                let body = sections
                    .iter()
                    .map(|s| format!("{}\n{}", s.heading(), s.body))
                    .collect::<Vec<_>>()
                    .join("\n\n");

                format!(
                    "{intro}\n\n\
                     Write a concise, clear email summarizing {owner_name}'s tasks for the day. \
                     Be warm and friendly, but keep the tone efficient: no unnecessary intro or fluff. \
                     Just a light greeting and a helpful task summary.\n\n\
                     At the top of the email, include this one-line summary:\n\
                     \"{summary}\"\n\n\
                     Then present the tasks by category, in the order given.\n\
                     Only mention the tasks listed below. Do not invent, rename, or add tasks.\n\n\
                     {body}\n\n\
                     End with a single uplifting quote or affirmation. Sign off as {assistant_name}.\n",
                    summary = self.summary_line,
                )
            }
        }
    }
}

/// "You have N overdue, M due today, P upcoming, Q later."
pub fn summary_line(counts: &BucketCounts, include_later: bool) -> String {
    let mut line = format!(
        "You have {} overdue, {} due today, {} upcoming",
        counts.overdue, counts.due_today, counts.upcoming
    );
    if include_later {
        line.push_str(&format!(", {} later", counts.later));
    }
    line.push('.');
    line
}

pub struct SummaryComposer {
    formatter: TaskFormatter,
    options: ComposeOptions,
    persona: Persona,
}

impl SummaryComposer {
    pub fn new(formatter: TaskFormatter, options: ComposeOptions, persona: Persona) -> Self {
        SummaryComposer {
            formatter,
            options,
            persona,
        }
    }

    pub fn compose(&self, buckets: &Buckets) -> Prompt {
        let kinds = self.options.reported_kinds();
        let summary_line = summary_line(&buckets.counts(), self.options.include_later);

        let variant = if kinds.iter().all(|kind| buckets.get(*kind).is_empty()) {
            PromptVariant::NoTasks
        } else {
            let sections = kinds
                .into_iter()
                .map(|kind| {
                    let bucket = buckets.get(kind);
                    Section {
                        kind,
                        count: bucket.len(),
                        body: self.formatter.render(bucket, self.options.rendering(kind)),
                    }
                })
                .collect();
            PromptVariant::Itemized(sections)
        };

        Prompt {
            summary_line,
            variant,
            persona: self.persona.clone(),
        }
    }
}
