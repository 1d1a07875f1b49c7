use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::{uuid, Uuid};

use crate::{
    telemetry::{SpanGuard, TraceSink},
    types::{ActivityRecord, ReplyRecord},
};

const ANDREW_ACTIVITY: Uuid = uuid!("68f126b0-1ceb-4a33-88be-d90fa7109eee");
const WORF_REPLY: Uuid = uuid!("26e12864-1c26-5c3a-9658-97a10f8fea67");
const WORF_ACTIVITY: Uuid = uuid!("66e12864-8c26-4c3a-9658-95a10f8fea67");
const GAREK_ACTIVITY: Uuid = uuid!("248959df-3079-4947-b847-9e0892d1bab4");
const OBINNA_ACTIVITY: Uuid = uuid!("5b7a1f42-9d3e-4c1a-8f6b-2e4d8c0a9b13");

/// Number of base records, reported as sub-operation metadata.
const BASE_RECORD_COUNT: i64 = 3;

/// Mock home feed, standing in until activities are backed by a database.
pub struct HomeActivities {
    sink: Arc<dyn TraceSink>,
}

impl HomeActivities {
    pub fn new(sink: Arc<dyn TraceSink>) -> Self {
        Self { sink }
    }

    pub fn get_snapshot(&self, caller_id: Option<&str>) -> Vec<ActivityRecord> {
        self.get_snapshot_at(caller_id, Utc::now())
    }

    /// Builds the feed with every timestamp offset from `now`.
    pub fn get_snapshot_at(
        &self,
        caller_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Vec<ActivityRecord> {
        let mut span = SpanGuard::start(self.sink.as_ref(), "home-activities-mock-data");

        span.begin_sub_operation("mock_data_generation");
        span.attach_metadata("user_count", BASE_RECORD_COUNT);
        span.end_sub_operation();

        let mut results = vec![
            activity(
                ANDREW_ACTIVITY,
                "Andrew Brown",
                "Cloud is fun!",
                now - Duration::days(2),
                now + Duration::days(5),
            )
            .with_engagement(5, 1, 0)
            .with_reply(
                WORF_REPLY,
                "Worf",
                "This post has no honor!",
                now - Duration::days(2),
            ),
            activity(
                WORF_ACTIVITY,
                "Worf",
                "I am out of prune juice",
                now - Duration::days(7),
                now + Duration::days(9),
            ),
            activity(
                GAREK_ACTIVITY,
                "Garek",
                "My dear doctor, I am just simple tailor",
                now - Duration::hours(1),
                now + Duration::hours(12),
            ),
        ];

        if caller_id.is_some() {
            let extra = activity(
                OBINNA_ACTIVITY,
                "obinna",
                "My dear brother, it is great to be back to the village",
                now - Duration::hours(1),
                now + Duration::hours(12),
            )
            .with_engagement(3000, 0, 0);
            results.insert(0, extra);
            span.set_attribute("app.result_length", results.len() as i64);
        }

        results
    }
}

fn activity(
    uuid: Uuid,
    handle: &str,
    message: &str,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> ActivityRecord {
    ActivityRecord {
        uuid,
        handle: handle.to_string(),
        message: message.to_string(),
        created_at,
        expires_at,
        likes_count: 0,
        replies_count: 0,
        reposts_count: 0,
        replies: vec![],
    }
}

impl ActivityRecord {
    fn with_engagement(mut self, likes: u32, replies: u32, reposts: u32) -> Self {
        self.likes_count = likes;
        self.replies_count = replies;
        self.reposts_count = reposts;
        self
    }

    // The parent id always comes from the owning activity.
    fn with_reply(
        mut self,
        uuid: Uuid,
        handle: &str,
        message: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        self.replies.push(ReplyRecord {
            uuid,
            reply_to_activity_uuid: self.uuid,
            handle: handle.to_string(),
            message: message.to_string(),
            created_at,
            likes_count: 0,
            replies_count: 0,
            reposts_count: 0,
        });
        self
    }
}
