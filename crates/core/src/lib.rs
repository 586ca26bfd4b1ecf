pub mod clean;
pub mod content;
pub mod convert;
pub mod error;
pub mod formatters;
pub mod locate;
pub mod metadata;
pub mod normalize;
pub mod parse;
pub mod pipeline;
pub mod postprocess;
pub mod sites;

pub use clean::clean_content;
pub use content::ContentNode;
pub use convert::{Action, ConvertOptions, Converter, Filter, Rule, resolve_image_url};
pub use error::{PagemarkError, Result};
pub use formatters::{assemble_document, render_header, suggested_filename, to_json};
pub use locate::{ContentSource, LocatedContent, LocatorConfig, MIN_BODY_RATIO, MIN_TEXT_LEN, locate_content};
pub use metadata::Metadata;
pub use normalize::{normalize_emphasis, normalize_html};
pub use parse::{Document, Element};
pub use pipeline::{PageOptions, Pipeline, PipelineConfig, PipelineConfigBuilder, PipelineResult, extract};
pub use postprocess::postprocess_markdown;
pub use sites::{SiteRules, SiteTable};
