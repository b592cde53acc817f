//! Post-run instructions for the operator

use sq_core::Settings;

const RULE_WIDTH: usize = 60;

/// Render the next-steps block shown after a successful squash
pub(crate) fn next_steps(settings: &Settings) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let up_path = settings.up_path();
    let backup_dir = settings.backup_dir.display();

    format!(
        "\n{rule}\n\
         NEXT STEPS:\n\
         {rule}\n\
         1. Review the new migration file:\n   \
            less {up}\n\
         \n\
         2. Reset your database:\n   \
            dropdb <dbname> && createdb <dbname>\n\
         \n\
         3. Apply the new migration:\n   \
            make migrate-up\n\
         \n\
         4. Verify schema:\n   \
            psql \"$POSTGRES_DSN\" -c '\\dt'\n\
         \n\
         5. Old migrations backed up at:\n   \
            {backup_dir}/\n\
         {rule}",
        up = up_path.display(),
    )
}

/// Print [`next_steps`] to stdout
pub(crate) fn print_next_steps(settings: &Settings) {
    println!("{}", next_steps(settings));
}
