use indicatif::{ProgressBar, ProgressStyle};

/// Spinner on stderr while a month loads. Hidden when stderr is not a
/// terminal, so piped output stays clean.
pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["-", "\\", "|", "/", ""])
        .template("{msg} {spinner}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Clear the terminal and move the cursor home.
pub fn clear_screen() {
    print!("\x1b[2J\x1b[H");
}
