//! Default argument injection.

use crate::catalog::Catalog;

/// Splice the configured defaults for `command` in after its token.
///
/// `offset` is the number of tokens a redirect inserted before the command,
/// so the command itself now sits at `position + offset`.
pub fn inject(
    args: &[String],
    command: &str,
    position: usize,
    offset: usize,
    catalog: &Catalog,
) -> Vec<String> {
    let defaults = catalog.defaults(command);
    if defaults.is_empty() {
        return args.to_vec();
    }

    let at = (position + 1 + offset).min(args.len());
    tracing::debug!("injecting defaults {:?} for '{}' at {}", defaults, command, at);

    let mut out = Vec::with_capacity(args.len() + defaults.len());
    out.extend_from_slice(&args[..at]);
    out.extend_from_slice(defaults);
    out.extend_from_slice(&args[at..]);
    out
}
