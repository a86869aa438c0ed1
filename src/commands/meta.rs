//! Page meta tag CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use backoffice_core::error::AppError;
use backoffice_core::types::id::MetaTagId;
use backoffice_entity::meta_tag::{MetaTag, MetaTagInput};

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for meta tag commands
#[derive(Debug, Args)]
pub struct MetaArgs {
    /// Meta tag subcommand
    #[command(subcommand)]
    pub command: MetaCommand,
}

/// Optional meta tag fields. An empty value clears the field.
#[derive(Debug, Args)]
pub struct MetaFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub keywords: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub og_title: Option<String>,
    #[arg(long)]
    pub og_description: Option<String>,
    #[arg(long)]
    pub og_image: Option<String>,
    /// Defaults to "website"
    #[arg(long)]
    pub og_type: Option<String>,
    /// Defaults to "summary_large_image"
    #[arg(long)]
    pub twitter_card: Option<String>,
    #[arg(long)]
    pub twitter_title: Option<String>,
    #[arg(long)]
    pub twitter_description: Option<String>,
    #[arg(long)]
    pub twitter_image: Option<String>,
}

impl MetaFields {
    /// Overlay the given fields onto `input`.
    fn apply(&self, mut input: MetaTagInput) -> MetaTagInput {
        let overlay = |current: &mut Option<String>, given: &Option<String>| {
            if let Some(value) = given {
                *current = Some(value.clone());
            }
        };
        overlay(&mut input.title, &self.title);
        overlay(&mut input.description, &self.description);
        overlay(&mut input.keywords, &self.keywords);
        overlay(&mut input.author, &self.author);
        overlay(&mut input.og_title, &self.og_title);
        overlay(&mut input.og_description, &self.og_description);
        overlay(&mut input.og_image, &self.og_image);
        overlay(&mut input.og_type, &self.og_type);
        overlay(&mut input.twitter_card, &self.twitter_card);
        overlay(&mut input.twitter_title, &self.twitter_title);
        overlay(&mut input.twitter_description, &self.twitter_description);
        overlay(&mut input.twitter_image, &self.twitter_image);
        input
    }
}

/// Meta tag subcommands
#[derive(Debug, Subcommand)]
pub enum MetaCommand {
    /// Search meta tags by page key or title
    List {
        /// Search term
        #[arg(short, long)]
        search: Option<String>,
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u64,
    },
    /// Show a meta tag
    Show {
        /// Meta tag ID
        id: MetaTagId,
    },
    /// Create meta tags for a page
    Create {
        /// Page key, e.g. "home" or "about"
        #[arg(long)]
        page: String,
        #[command(flatten)]
        fields: MetaFields,
    },
    /// Edit a meta tag; omitted fields keep their value
    Update {
        /// Meta tag ID
        id: MetaTagId,
        /// New page key
        #[arg(long)]
        page: Option<String>,
        #[command(flatten)]
        fields: MetaFields,
    },
    /// Delete a meta tag
    Delete {
        /// Meta tag ID
        id: MetaTagId,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the meta tags a request path renders with
    Resolve {
        /// Request path, e.g. "/" or "/about"
        path: String,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct MetaTagRow {
    id: String,
    page: String,
    title: String,
    og_type: String,
    updated_at: String,
}

impl From<&MetaTag> for MetaTagRow {
    fn from(t: &MetaTag) -> Self {
        Self {
            id: t.id.to_string(),
            page: t.page.clone(),
            title: t.title.clone().unwrap_or_default(),
            og_type: t.og_type.clone(),
            updated_at: super::timestamp(&t.updated_at),
        }
    }
}

fn input_from(tag: MetaTag) -> MetaTagInput {
    MetaTagInput {
        page: tag.page,
        title: tag.title,
        description: tag.description,
        keywords: tag.keywords,
        author: tag.author,
        og_title: tag.og_title,
        og_description: tag.og_description,
        og_image: tag.og_image,
        og_type: Some(tag.og_type),
        twitter_card: Some(tag.twitter_card),
        twitter_title: tag.twitter_title,
        twitter_description: tag.twitter_description,
        twitter_image: tag.twitter_image,
    }
}

/// Execute meta tag commands
pub async fn execute(
    args: &MetaArgs,
    app: &App,
    actor: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    if let MetaCommand::Resolve { path } = &args.command {
        let resolved = app.resolver().resolve(path).await?;
        output::print_item(&resolved, format);
        return Ok(());
    }

    let ctx = app.actor(actor).await?;
    let service = app.meta_tags();

    match &args.command {
        MetaCommand::List { search, page } => {
            let result = service.list(&ctx, search.clone(), *page).await?;
            let rows: Vec<MetaTagRow> = result.items.iter().map(MetaTagRow::from).collect();
            output::print_page(&result, &rows, format);
        }
        MetaCommand::Show { id } => {
            let tag = service.get(&ctx, *id).await?;
            output::print_item(&tag, format);
        }
        MetaCommand::Create { page, fields } => {
            let input = fields.apply(MetaTagInput::for_page(page.clone()));
            let outcome = service.create(&ctx, input).await?;
            output::report_outcome(&outcome, format)?;
        }
        MetaCommand::Update { id, page, fields } => {
            let mut input = fields.apply(input_from(service.get(&ctx, *id).await?));
            if let Some(page) = page {
                input.page = page.clone();
            }
            let outcome = service.update(&ctx, *id, input).await?;
            output::report_outcome(&outcome, format)?;
        }
        MetaCommand::Delete { id, yes } => {
            let tag = service.get(&ctx, *id).await?;
            if !super::confirm(&format!("Delete meta tags for page '{}'?", tag.page), *yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let outcome = service.delete(&ctx, *id).await?;
            output::report_outcome(&outcome, format)?;
        }
        MetaCommand::Resolve { .. } => {}
    }

    Ok(())
}
