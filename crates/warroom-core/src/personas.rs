//! Persona responses
//!
//! The three war-room personas each answer a query from their own
//! angle: the Driver on fleet positioning, the Rider on group
//! coordination, the City Planner on traffic flow. Template rendering
//! is pure and deterministic for a given query and set of aggregates;
//! the responder layers optional text generation on top and falls back
//! to the templates when generation fails.

use tracing::warn;

use crate::models::{ConversationTurn, Persona, PersonaResponse, ResponseSource};
use crate::stats::TripAggregates;
use crate::textgen::{TextGenBackend, TextGenClient};

/// Recognized query topic, matched on keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTopic {
    PeakHours,
    Campus,
    Downtown,
    General,
}

impl QueryTopic {
    /// Classify a free-text query
    ///
    /// First matching topic wins, checked in the order peak, campus,
    /// downtown.
    pub fn detect(query: &str) -> Self {
        let q = query.to_lowercase();
        if q.contains("rush hour") || q.contains("peak") {
            QueryTopic::PeakHours
        } else if q.contains("campus") || q.contains("university") {
            QueryTopic::Campus
        } else if q.contains("downtown") || q.contains("6th street") {
            QueryTopic::Downtown
        } else {
            QueryTopic::General
        }
    }
}

fn campus_trip_count(agg: &TripAggregates) -> u64 {
    agg.zone_counts.get("West Campus").copied().unwrap_or(0)
        + agg.zone_counts.get("University District").copied().unwrap_or(0)
}

fn downtown_trip_count(agg: &TripAggregates) -> u64 {
    agg.zone_counts.get("Downtown Austin").copied().unwrap_or(0)
}

/// Render a persona's scripted answer for a query
///
/// Pure function over the query text and aggregates.
pub fn render_response(persona: Persona, query: &str, agg: &TripAggregates) -> String {
    let topic = QueryTopic::detect(query);
    match persona {
        Persona::Driver => render_driver(topic, agg),
        Persona::Rider => render_rider(topic, agg),
        Persona::Planner => render_planner(topic, agg),
    }
}

fn render_driver(topic: QueryTopic, agg: &TripAggregates) -> String {
    match topic {
        QueryTopic::PeakHours => {
            let peak = agg.peak_hour.unwrap_or(21);
            format!(
                "DRIVER STRATEGY: Position vehicles near West Campus by {}:00. \
                 Based on {} trips, I predict a demand surge at {}:00. Deploy \
                 60% of the fleet to student housing areas, they are the \
                 biggest group generators!",
                peak.saturating_sub(1),
                agg.total_trips,
                peak
            )
        }
        QueryTopic::Campus => format!(
            "CAMPUS DEPLOYMENT: The campus zones show {} trips at {:.1} \
             average group size. Position vehicles at The Standard, the \
             Castilian, and the Villas at San Gabriel. Students book in \
             waves, so be ready for 8-10 person groups!",
            campus_trip_count(agg),
            agg.avg_group_size
        ),
        QueryTopic::Downtown => format!(
            "DOWNTOWN STRATEGY: {} downtown trips detected. Deploy vehicles \
             near Rainey Street and 6th Street by 8 PM. Groups form at bars \
             first, then migrate. Position for the second wave!",
            downtown_trip_count(agg)
        ),
        QueryTopic::General => format!(
            "DRIVER INSIGHT: Based on {} trips, I recommend positioning \
             vehicles in high-density pickup zones. Average group size is \
             {:.1}, so optimize for larger vehicles!",
            agg.total_trips, agg.avg_group_size
        ),
    }
}

fn render_rider(topic: QueryTopic, agg: &TripAggregates) -> String {
    match topic {
        QueryTopic::PeakHours => "RIDER INSIGHT: Peak hours are when groups naturally form! \
             Students coordinate rides to events, bars, and campus. The real \
             demand is group coordination, not individual rides. We need \
             better group matching!"
            .to_string(),
        QueryTopic::Campus => format!(
            "STUDENT PERSPECTIVE: Campus groups are social! {} trips at {:.1} \
             average group size. Students want to ride together to events, \
             not split up. We need group-friendly pricing and vehicle \
             options!",
            campus_trip_count(agg),
            agg.avg_group_size
        ),
        QueryTopic::Downtown => "NIGHTLIFE INSIGHT: Downtown groups form organically at bars \
             and restaurants. Nobody plans a group ride, it happens when \
             friends decide to go out together. We need real-time group \
             formation tools!"
            .to_string(),
        QueryTopic::General => format!(
            "RIDER PERSPECTIVE: From {} trips I see groups want to stay \
             together. An average of {:.1} people per trip shows social \
             riding is key. We need better group coordination features!",
            agg.total_trips, agg.avg_group_size
        ),
    }
}

fn render_planner(topic: QueryTopic, agg: &TripAggregates) -> String {
    match topic {
        QueryTopic::PeakHours => "URBAN PLANNING: Peak hours create traffic bottlenecks! \
             Concentrating all vehicles in one area causes gridlock. We need \
             distributed deployment across multiple zones to keep traffic \
             flowing."
            .to_string(),
        QueryTopic::Campus => "CAMPUS PLANNING: University areas need special consideration. \
             High-density student housing creates concentrated demand \
             spikes. We need dedicated pickup zones and traffic management \
             to prevent campus gridlock."
            .to_string(),
        QueryTopic::Downtown => "DOWNTOWN PLANNING: Entertainment districts have unique \
             patterns. Groups form at venues and then disperse. We need \
             dynamic zoning that adapts to event schedules and prevents \
             downtown traffic jams."
            .to_string(),
        QueryTopic::General => format!(
            "CITY PERSPECTIVE: From {} trips I see we need balanced \
             distribution. An average group size of {:.1} calls for larger \
             vehicles, but we must maintain traffic flow across all Austin \
             districts!",
            agg.total_trips, agg.avg_group_size
        ),
    }
}

const DRIVER_PREDICTIONS: &[&str] = &[
    "PREDICTION: Three groups will form near The Standard at Austin within 15 minutes.",
    "PREDICTION: West Campus will see 5x normal demand in 30 minutes.",
    "PREDICTION: Downtown surge expected at 9 PM. Position eight vehicles near Rainey Street.",
    "PREDICTION: A Moody Center event will create 12-person group formations in 45 minutes.",
];

const RIDER_PREDICTIONS: &[&str] = &[
    "PREDICTION: Five solo riders will form a group at The Castilian in 20 minutes.",
    "PREDICTION: A Moody Center event will create three groups of 8+ people each.",
    "PREDICTION: A Rainey Street bar crawl will generate four connected group rides.",
    "PREDICTION: West Campus students will coordinate a 6-person group to downtown in 35 minutes.",
];

const PLANNER_PREDICTIONS: &[&str] = &[
    "PREDICTION: West Campus concentration will create 15-minute traffic delays.",
    "PREDICTION: The downtown surge will require traffic light optimization.",
    "PREDICTION: Campus pickup zones will need expansion within 30 minutes.",
    "PREDICTION: Cross-town routes will see 40% increased demand.",
];

/// Pick a persona's prediction, keyed on the aggregates
///
/// The same dataset always yields the same prediction.
pub fn render_prediction(persona: Persona, agg: &TripAggregates) -> String {
    let pool = match persona {
        Persona::Driver => DRIVER_PREDICTIONS,
        Persona::Rider => RIDER_PREDICTIONS,
        Persona::Planner => PLANNER_PREDICTIONS,
    };
    let key = agg.total_trips + u64::from(agg.peak_hour.unwrap_or(0));
    pool[(key as usize) % pool.len()].to_string()
}

/// Which persona's strategy wins a query
///
/// The Driver owns peak-hour strategy, the Rider understands campus
/// social dynamics, the Planner manages downtown traffic. The Driver
/// takes general queries.
pub fn pick_winner(query: &str) -> Persona {
    match QueryTopic::detect(query) {
        QueryTopic::PeakHours => Persona::Driver,
        QueryTopic::Campus => Persona::Rider,
        QueryTopic::Downtown => Persona::Planner,
        QueryTopic::General => Persona::Driver,
    }
}

/// Runs a query through all three personas
pub struct PersonaResponder {
    client: TextGenClient,
}

impl PersonaResponder {
    pub fn new(client: TextGenClient) -> Self {
        Self { client }
    }

    /// Build a responder from the process environment
    pub fn from_env() -> Self {
        Self::new(TextGenClient::from_env())
    }

    /// Short label for the active backend, e.g. `openai (gpt-4o-mini)`
    pub fn backend_label(&self) -> String {
        match self.client.source() {
            ResponseSource::Generated => format!("openai ({})", self.client.model()),
            ResponseSource::Template => "template".to_string(),
        }
    }

    /// Where the active backend runs
    pub fn backend_host(&self) -> &str {
        self.client.host()
    }

    /// Whether the active backend can currently serve requests
    pub async fn backend_healthy(&self) -> bool {
        self.client.health_check().await
    }

    /// Answer a query with all three personas
    ///
    /// Always returns exactly three responses in `Persona::all()` order.
    /// A failed generation call falls back to the persona's template and
    /// is marked [`ResponseSource::Template`].
    pub async fn respond_all(&self, query: &str, agg: &TripAggregates) -> ConversationTurn {
        let mut responses = Vec::with_capacity(3);
        for &persona in Persona::all() {
            let response = match self.client.respond(persona, query, agg).await {
                Ok(text) => PersonaResponse {
                    persona,
                    text,
                    source: self.client.source(),
                },
                Err(e) => {
                    warn!(persona = persona.as_str(), error = %e, "text generation failed, using template");
                    PersonaResponse {
                        persona,
                        text: render_response(persona, query, agg),
                        source: ResponseSource::Template,
                    }
                }
            };
            responses.push(response);
        }

        ConversationTurn {
            query: query.to_string(),
            responses,
            winner: pick_winner(query),
            asked_at: chrono::Utc::now(),
        }
    }

    /// One prediction per persona, in `Persona::all()` order
    pub fn predictions(&self, agg: &TripAggregates) -> Vec<PersonaResponse> {
        Persona::all()
            .iter()
            .map(|&persona| PersonaResponse {
                persona,
                text: render_prediction(persona, agg),
                source: ResponseSource::Template,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample_dataset;
    use crate::stats::aggregate;

    #[test]
    fn test_topic_detection() {
        assert_eq!(QueryTopic::detect("Where during PEAK hours?"), QueryTopic::PeakHours);
        assert_eq!(QueryTopic::detect("rush hour strategy"), QueryTopic::PeakHours);
        assert_eq!(QueryTopic::detect("what about campus?"), QueryTopic::Campus);
        assert_eq!(QueryTopic::detect("University demand"), QueryTopic::Campus);
        assert_eq!(QueryTopic::detect("downtown tonight"), QueryTopic::Downtown);
        assert_eq!(QueryTopic::detect("6th Street plans"), QueryTopic::Downtown);
        assert_eq!(QueryTopic::detect("how are things"), QueryTopic::General);
        // Peak beats campus when both appear
        assert_eq!(QueryTopic::detect("peak campus times"), QueryTopic::PeakHours);
    }

    #[test]
    fn test_each_persona_answers_every_topic() {
        let agg = aggregate(&sample_dataset());
        for query in ["peak hours", "campus crowd", "downtown rush?", "hello"] {
            for &persona in Persona::all() {
                let text = render_response(persona, query, &agg);
                assert!(!text.is_empty());
            }
        }
    }

    #[test]
    fn test_responses_are_deterministic() {
        let agg = aggregate(&sample_dataset());
        let a = render_response(Persona::Driver, "peak hours", &agg);
        let b = render_response(Persona::Driver, "peak hours", &agg);
        assert_eq!(a, b);
    }

    #[test]
    fn test_driver_peak_response_uses_peak_hour() {
        let agg = aggregate(&sample_dataset());
        let text = render_response(Persona::Driver, "rush hour", &agg);
        assert!(text.contains("21:00"));
        assert!(text.contains("15 trips"));
    }

    #[test]
    fn test_winner_routing() {
        assert_eq!(pick_winner("peak hour demand"), Persona::Driver);
        assert_eq!(pick_winner("campus pickups"), Persona::Rider);
        assert_eq!(pick_winner("downtown congestion"), Persona::Planner);
        assert_eq!(pick_winner("anything else"), Persona::Driver);
    }

    #[test]
    fn test_predictions_deterministic_per_dataset() {
        let agg = aggregate(&sample_dataset());
        for &persona in Persona::all() {
            let a = render_prediction(persona, &agg);
            let b = render_prediction(persona, &agg);
            assert_eq!(a, b);
        }
    }

    #[tokio::test]
    async fn test_generation_failure_falls_back_to_templates() {
        use crate::test_utils::{MockMode, MockTextGenServer};
        use crate::textgen::OpenAiBackend;

        let server = MockTextGenServer::start(MockMode::Fail).await;
        let client = TextGenClient::OpenAi(OpenAiBackend::new(&server.url(), "mock-model", None));
        let agg = aggregate(&sample_dataset());

        let turn = PersonaResponder::new(client)
            .respond_all("campus strategy", &agg)
            .await;

        assert_eq!(turn.responses.len(), 3);
        for response in &turn.responses {
            assert!(matches!(response.source, ResponseSource::Template));
            assert_eq!(
                response.text,
                render_response(response.persona, "campus strategy", &agg)
            );
        }
        assert_eq!(turn.winner, Persona::Rider);
    }

    #[tokio::test]
    async fn test_slow_generation_times_out_to_templates() {
        use crate::test_utils::{MockMode, MockTextGenServer};
        use crate::textgen::OpenAiBackend;
        use std::time::Duration;

        let server = MockTextGenServer::start(MockMode::Stall).await;
        let backend = OpenAiBackend::with_timeout(
            &server.url(),
            "mock-model",
            None,
            Duration::from_millis(200),
        );
        let agg = aggregate(&sample_dataset());

        let turn = PersonaResponder::new(TextGenClient::OpenAi(backend))
            .respond_all("where should we go during peak?", &agg)
            .await;

        for response in &turn.responses {
            assert!(matches!(response.source, ResponseSource::Template));
        }
    }

    #[tokio::test]
    async fn test_working_generation_marks_responses_generated() {
        use crate::test_utils::{MockMode, MockTextGenServer};
        use crate::textgen::OpenAiBackend;

        let server = MockTextGenServer::start(MockMode::Respond).await;
        let client = TextGenClient::OpenAi(OpenAiBackend::new(&server.url(), "mock-model", None));
        let agg = aggregate(&sample_dataset());

        let turn = PersonaResponder::new(client)
            .respond_all("downtown tonight", &agg)
            .await;

        for response in &turn.responses {
            assert!(matches!(response.source, ResponseSource::Generated));
            assert!(response.text.contains("Mock strategic assessment"));
        }
        assert_eq!(turn.winner, Persona::Planner);
    }

    #[tokio::test]
    async fn test_template_client_yields_three_template_responses() {
        let agg = aggregate(&sample_dataset());
        let responder = PersonaResponder::new(TextGenClient::template());
        let turn = responder.respond_all("peak hour help", &agg).await;

        assert_eq!(turn.responses.len(), 3);
        let personas: Vec<Persona> = turn.responses.iter().map(|r| r.persona).collect();
        assert_eq!(personas, Persona::all().to_vec());
        for response in &turn.responses {
            assert!(matches!(response.source, ResponseSource::Template));
            assert_eq!(
                response.text,
                render_response(response.persona, "peak hour help", &agg)
            );
        }
        assert_eq!(turn.winner, Persona::Driver);
    }
}
