use crate::args::CodesArgs;
use crate::commands::Out;
use crate::reconcile::material_codes;
use crate::session::Session;
use crate::source::read_table;
use crate::{Config, Result};

/// Lists the material code filter options: `(all)` and then every distinct code in the merged
/// data, sorted.
pub fn codes(config: &Config, args: &CodesArgs) -> Result<Out<Vec<String>>> {
    let mut session = Session::from_config(config)?;
    session.upload(&read_table(args.transactions(), args.sheet())?)?;
    if let Some(manual) = args.manual() {
        session.add_manual_table(&read_table(manual, None)?)?;
    }
    let merged = session.reconcile()?;
    let options: Vec<String> = material_codes(&merged)
        .iter()
        .map(|o| o.to_string())
        .collect();
    Ok(Out::new(options.join("\n"), options))
}
