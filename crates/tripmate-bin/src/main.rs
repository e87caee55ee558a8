// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! tripmate server entry point.

use tripmate_bin::{commands, error::report_error_and_exit, init_logging, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    // The file's logging section applies before the command reloads it.
    let file_logging = cli
        .config
        .exists()
        .then(|| tripmate_config::load_config(&cli.config).ok())
        .flatten()
        .map(|config| config.logging);
    let (level, format) = cli.logging_settings(file_logging.as_ref());

    init_logging(&level, format);

    if let Err(e) = commands::execute(cli).await {
        tracing::error!(error = %e, "Command failed");
        report_error_and_exit(e);
    }
}
