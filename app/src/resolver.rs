//! System/utility query resolver: time, date, machine info.

use async_trait::async_trait;
use chrono::Local;
use stagehand_runtime::{SystemAnswer, SystemQueryResolver};
use sysinfo::System;

/// Answers the small set of queries the OS can answer faster and more
/// reliably than any model.
pub struct DesktopQueryResolver;

impl DesktopQueryResolver {
    pub fn new() -> Self {
        Self
    }

    fn time_answer(&self) -> String {
        format!(
            "The current time is {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )
    }

    fn date_answer(&self) -> String {
        format!("Today's date is {}", Local::now().format("%A, %B %d, %Y"))
    }

    fn system_info_answer(&self) -> String {
        let mut system = System::new_all();
        system.refresh_all();

        let gib = 1024.0 * 1024.0 * 1024.0;
        format!(
            "System information:\nos: {}\nhostname: {}\ncpu_count: {}\nmemory_total_gb: {:.2}\nmemory_available_gb: {:.2}",
            System::name().unwrap_or_else(|| "unknown".to_string()),
            System::host_name().unwrap_or_else(|| "unknown".to_string()),
            system.cpus().len(),
            system.total_memory() as f64 / gib,
            system.available_memory() as f64 / gib,
        )
    }
}

impl Default for DesktopQueryResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SystemQueryResolver for DesktopQueryResolver {
    async fn handle_query(&self, query: &str) -> Option<SystemAnswer> {
        let lowered = query.to_lowercase();

        if ["what time", "current time", "time is it"]
            .iter()
            .any(|kw| lowered.contains(kw))
        {
            return Some(SystemAnswer {
                description: self.time_answer(),
            });
        }

        if ["what date", "what day", "today's date", "date today"]
            .iter()
            .any(|kw| lowered.contains(kw))
        {
            return Some(SystemAnswer {
                description: self.date_answer(),
            });
        }

        if ["system info", "system information", "computer info"]
            .iter()
            .any(|kw| lowered.contains(kw))
        {
            return Some(SystemAnswer {
                description: self.system_info_answer(),
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_time_query_claimed() {
        let resolver = DesktopQueryResolver::new();
        let answer = resolver.handle_query("what time is it?").await.unwrap();
        assert!(answer.description.starts_with("The current time is"));
    }

    #[tokio::test]
    async fn test_date_query_claimed() {
        let resolver = DesktopQueryResolver::new();
        let answer = resolver.handle_query("What day is it today?").await.unwrap();
        assert!(answer.description.starts_with("Today's date is"));
    }

    #[tokio::test]
    async fn test_system_info_query_claimed() {
        let resolver = DesktopQueryResolver::new();
        let answer = resolver.handle_query("show me system info").await.unwrap();
        assert!(answer.description.contains("cpu_count"));
    }

    #[tokio::test]
    async fn test_task_query_not_claimed() {
        let resolver = DesktopQueryResolver::new();
        assert!(resolver.handle_query("open firefox").await.is_none());
    }

    #[tokio::test]
    async fn test_word_time_alone_is_not_enough() {
        let resolver = DesktopQueryResolver::new();
        // "timer" or prose mentioning time shouldn't short-circuit tasks.
        assert!(resolver.handle_query("set a timer for pasta").await.is_none());
    }
}
