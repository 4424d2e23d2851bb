/*!
 * Translation project persistence.
 *
 * - `state`: Units and the content stage ledger
 * - `terms`: Extracted terms and the extraction and glossary ledgers
 * - `store`: Directory layout and atomic JSON persistence
 */

pub mod state;
pub mod store;
pub mod terms;

pub use state::{ImportSummary, ProjectState};
pub use store::ProjectStore;
pub use terms::{ExtractedTerms, TermEntry};
