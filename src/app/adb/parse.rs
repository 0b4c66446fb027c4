use crate::app::models::DeviceSummary;

/// State marker `adb devices` prints for an online, authorized device.
pub const ONLINE_STATE: &str = "device";

pub fn parse_adb_devices(output: &str) -> Vec<DeviceSummary> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.trim_start().starts_with('*'))
        .filter(|line| !line.to_lowercase().contains("list of devices"))
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 2 {
                return None;
            }
            // Long-format descriptors after the state (`model:` etc.) are not needed.
            Some(DeviceSummary {
                serial: tokens[0].to_string(),
                state: tokens[1].to_string(),
            })
        })
        .collect()
}

/// Serials whose state is exactly the online marker.
pub fn online_serials(output: &str) -> Vec<String> {
    parse_adb_devices(output)
        .into_iter()
        .filter(|device| device.state == ONLINE_STATE)
        .map(|device| device.serial)
        .collect()
}

/// `pidof` prints space separated pids; nothing at all when the package is not running.
pub fn parse_pidof(output: &str) -> Vec<u32> {
    output
        .split_whitespace()
        .filter_map(|token| token.parse::<u32>().ok())
        .collect()
}

/// True when a `ps -p <pid>` row lists the pid in its PID column.
pub fn ps_lists_pid(output: &str, pid: u32) -> bool {
    let wanted = pid.to_string();
    let mut lines = output.lines().filter(|line| !line.trim().is_empty());
    let Some(header) = lines.next() else {
        return false;
    };
    let pid_column = header
        .split_whitespace()
        .position(|column| column.eq_ignore_ascii_case("PID"));
    match pid_column {
        Some(index) => {
            lines.any(|line| line.split_whitespace().nth(index) == Some(wanted.as_str()))
        }
        // Toolbox builds without a header: fall back to any token matching.
        None => std::iter::once(header)
            .chain(lines)
            .any(|line| line.split_whitespace().any(|token| token == wanted)),
    }
}

pub fn contains_process(ps_output: &str, name: &str) -> bool {
    ps_output
        .lines()
        .filter(|line| !line.contains("grep"))
        .any(|line| line.split_whitespace().any(|token| token.ends_with(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_devices_with_and_without_long_format() {
        let output = "* daemon started successfully\n\
                      List of devices attached\n\
                      emulator-5554\tdevice product:sdk_gphone64 model:Pixel_7 transport_id:1\n\
                      0123456789ABCDEF\tunauthorized\n\
                      R58M12345\toffline\n\n";
        let devices = parse_adb_devices(output);
        assert_eq!(devices.len(), 3);
        assert_eq!(
            devices[0],
            DeviceSummary {
                serial: "emulator-5554".to_string(),
                state: "device".to_string(),
            }
        );
        assert_eq!(devices[1].state, "unauthorized");

        assert_eq!(online_serials(output), vec!["emulator-5554".to_string()]);
    }

    #[test]
    fn no_devices_yields_empty_list() {
        assert!(online_serials("List of devices attached\n\n").is_empty());
    }

    #[test]
    fn pidof_parsing_ignores_noise() {
        assert_eq!(parse_pidof("4242\n"), vec![4242]);
        assert_eq!(parse_pidof("12 34"), vec![12, 34]);
        assert!(parse_pidof("").is_empty());
        assert!(parse_pidof("  \n").is_empty());
    }

    #[test]
    fn ps_pid_lookup_uses_pid_column() {
        let output = "USER       PID  PPID     VSZ   RSS WCHAN  ADDR S NAME\n\
                      u0_a123   1234   567 1234567 89012 0         0 S com.example.app\n";
        assert!(ps_lists_pid(output, 1234));
        // 567 only appears as the parent pid.
        assert!(!ps_lists_pid(output, 567));
        assert!(!ps_lists_pid(output, 123));
        assert!(!ps_lists_pid("USER PID PPID NAME\n", 1234));
        assert!(!ps_lists_pid("", 1234));
    }

    #[test]
    fn finds_frida_server_but_not_the_grep_itself() {
        let output = "root  4321  1 0 S /data/local/tmp/frida-server\n\
                      shell 9999  1 0 S grep frida-server\n";
        assert!(contains_process(output, "frida-server"));
        assert!(!contains_process("shell 9999 1 0 S grep frida-server\n", "frida-server"));
    }
}
