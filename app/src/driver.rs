//! Process-spawning input driver.
//!
//! Every plan step becomes exactly one invocation of the configured
//! injection binary. The binary owns the actual pointer/keyboard work;
//! this wrapper only translates steps into argument lists and reports
//! pass/fail.

use async_trait::async_trait;
use stagehand_executor::{DriverError, InputDriver};
use stagehand_core::{ClickMode, MouseButton};
use tracing::debug;

pub struct ProcessDriver {
    program: String,
}

impl ProcessDriver {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: Vec<String>) -> Result<(), DriverError> {
        debug!("injector: {} {:?}", self.program, args);
        let output = tokio::process::Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|e| DriverError::Injection(format!("failed to spawn injector: {}", e)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(DriverError::Injection(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}

fn button_arg(button: MouseButton) -> String {
    u8::from(button).to_string()
}

fn mode_arg(mode: ClickMode) -> &'static str {
    match mode {
        ClickMode::Single => "single",
        ClickMode::Double => "double",
    }
}

#[async_trait]
impl InputDriver for ProcessDriver {
    async fn move_pointer(&self, x: i32, y: i32) -> Result<(), DriverError> {
        self.run(vec!["pointer".into(), x.to_string(), y.to_string()])
            .await
    }

    async fn click(
        &self,
        button: MouseButton,
        mode: ClickMode,
        location: Option<[i32; 2]>,
    ) -> Result<(), DriverError> {
        let mut args = vec!["click".into(), button_arg(button), mode_arg(mode).into()];
        if let Some([x, y]) = location {
            args.push(x.to_string());
            args.push(y.to_string());
        }
        self.run(args).await
    }

    async fn type_text(&self, text: &str) -> Result<(), DriverError> {
        self.run(vec!["type".into(), text.to_string()]).await
    }

    async fn press_key(&self, key: &str) -> Result<(), DriverError> {
        self.run(vec!["key".into(), key.to_string()]).await
    }

    async fn key_combo(&self, combo: &str) -> Result<(), DriverError> {
        self.run(vec!["combo".into(), combo.to_string()]).await
    }

    async fn drag(&self, start: [i32; 2], end: [i32; 2], duration: f64) -> Result<(), DriverError> {
        self.run(vec![
            "drag".into(),
            start[0].to_string(),
            start[1].to_string(),
            end[0].to_string(),
            end[1].to_string(),
            duration.to_string(),
        ])
        .await
    }

    async fn scroll(&self, x: i32, y: i32, amount: i32) -> Result<(), DriverError> {
        self.run(vec![
            "scroll".into(),
            x.to_string(),
            y.to_string(),
            amount.to_string(),
        ])
        .await
    }

    async fn swipe(&self, start: [i32; 2], end: [i32; 2], duration: f64) -> Result<(), DriverError> {
        self.run(vec![
            "swipe".into(),
            start[0].to_string(),
            start[1].to_string(),
            end[0].to_string(),
            end[1].to_string(),
            duration.to_string(),
        ])
        .await
    }

    async fn multi_click(&self, x: i32, y: i32, count: u32, delay: f64) -> Result<(), DriverError> {
        self.run(vec![
            "multiclick".into(),
            x.to_string(),
            y.to_string(),
            count.to_string(),
            delay.to_string(),
        ])
        .await
    }

    async fn wait_for_window(&self, window: &str, timeout_secs: u64) -> Result<(), DriverError> {
        self.run(vec![
            "waitfor".into(),
            window.to_string(),
            timeout_secs.to_string(),
        ])
        .await
    }

    async fn screenshot(&self, filename: &str) -> Result<(), DriverError> {
        self.run(vec!["screenshot".into(), filename.to_string()])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_reports_injection_error() {
        let driver = ProcessDriver::new("/nonexistent/stagehand-inject");
        let result = driver.move_pointer(10, 10).await;
        assert!(matches!(result, Err(DriverError::Injection(_))));
    }

    #[tokio::test]
    async fn test_successful_spawn_passes() {
        // `true` exits 0 everywhere we build.
        let driver = ProcessDriver::new("true");
        assert!(driver.press_key("Return").await.is_ok());
    }

    #[tokio::test]
    async fn test_failing_binary_reports_failure() {
        let driver = ProcessDriver::new("false");
        assert!(driver.press_key("Return").await.is_err());
    }
}
