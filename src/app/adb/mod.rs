pub mod locator;
pub mod parse;

/// `adb [-s <device>] <rest...>`
pub fn adb_args(device_id: Option<&str>, rest: &[&str]) -> Vec<String> {
    let mut args = Vec::with_capacity(rest.len() + 2);
    if let Some(device) = device_id {
        args.push("-s".to_string());
        args.push(device.to_string());
    }
    args.extend(rest.iter().map(|value| value.to_string()));
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_selector_precedes_subcommand() {
        assert_eq!(
            adb_args(Some("emulator-5554"), &["shell", "pidof", "com.example.app"]),
            vec!["-s", "emulator-5554", "shell", "pidof", "com.example.app"]
        );
        assert_eq!(adb_args(None, &["devices"]), vec!["devices"]);
    }
}
