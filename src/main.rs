use std::process::exit;

use human_panic::setup_panic;

use file_toolkit::prelude::*;

fn main() {
    setup_panic!();

    let matches = get_matches();
    let log_file = match get_log_file(&matches) {
        Ok(log_file) => log_file,
        Err(e) => {
            eprintln!("{}", failure_line(&e.to_string()));
            exit(1);
        }
    };
    if let Err(e) = init_logger(get_verbosity(&matches), log_file.as_deref()) {
        eprintln!("{}", failure_line(&format!("Failed to initialise logging: {e}")));
        exit(1);
    }

    let result = load_or_default(&get_config_path(&matches))
        .and_then(|settings| run_command(&matches, &settings));
    if let Err(e) = result {
        log::debug!("{e:?}");
        eprintln!("{}", failure_line(&format!("{e:#}")));
        exit(1);
    }
}
