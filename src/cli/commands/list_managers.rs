//! List-managers command - print the package managers this crate can scan

use super::ListManagersArgs;
use crate::cli::exit_codes;
use crate::error::DeptrustError;
use crate::scanners::registry::known_managers;

pub async fn execute(args: ListManagersArgs) -> Result<i32, DeptrustError> {
    let managers = known_managers();

    if args.json {
        println!("{}", serde_json::to_string_pretty(managers)?);
    } else {
        for manager in managers {
            println!("{manager}");
        }
    }

    Ok(exit_codes::SUCCESS)
}
