//! Wire payloads for the analysis and audio endpoints
//!
//! All four modes converge on one request shape here, and the single response
//! shape is split back into mode-specific results.

use crate::session::{AnalysisResult, ImageBlob, ManualAnswers, Mode, Names, Session};
use crate::session::FeedbackStyle;
use crate::{Result, TasteError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Body of `POST /analyze`
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub mode: Mode,
    pub style: FeedbackStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_b: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<ManualAnswers>,
}

/// A request together with the names captured for it
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedAnalysis {
    pub request: AnalysisRequest,
    pub names: Names,
}

/// Transport-encode one image
pub fn encode_image(blob: &ImageBlob) -> String {
    STANDARD.encode(blob.bytes.as_slice())
}

impl AnalysisRequest {
    /// Assemble the request for the session's current inputs
    ///
    /// Images are encoded one at a time in slot order; unset slots are skipped.
    pub fn prepare(session: &Session) -> Result<PreparedAnalysis> {
        let (mode, style) = match (session.mode, &session.feedback_style) {
            (Some(mode), Some(style)) if session.is_ready() => (mode, style.clone()),
            _ => {
                return Err(TasteError::ValidationError(
                    "Analysis needs complete inputs and a feedback style".to_string(),
                ))
            }
        };

        let names = session.names.capture(mode.is_battle());
        let mut request = AnalysisRequest {
            mode,
            style,
            user_name: None,
            name_a: None,
            name_b: None,
            images: None,
            answers: None,
        };

        if mode == Mode::Manual {
            request.answers = session.answers.clone();
        } else {
            let mut images = Vec::with_capacity(session.images.populated_count());
            for blob in session.images.populated() {
                images.push(encode_image(blob));
            }
            request.images = Some(images);
        }

        match &names {
            Names::Single(user_name) => request.user_name = Some(user_name.clone()),
            Names::Pair { name_a, name_b } => {
                request.name_a = Some(name_a.clone());
                request.name_b = Some(name_b.clone());
            }
        }

        Ok(PreparedAnalysis { request, names })
    }
}

/// Body of a successful `POST /analyze` response
///
/// Battle responses carry `scoreA`/`scoreB`, every other mode carries `score`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, rename = "scoreA", skip_serializing_if = "Option::is_none")]
    pub score_a: Option<f64>,
    #[serde(default, rename = "scoreB", skip_serializing_if = "Option::is_none")]
    pub score_b: Option<f64>,
    #[serde(default)]
    pub analysis: String,
}

impl AnalysisResponse {
    pub fn single(score: f64, analysis: impl Into<String>) -> Self {
        Self {
            score: Some(score),
            analysis: analysis.into(),
            ..Default::default()
        }
    }

    pub fn battle(score_a: f64, score_b: f64, analysis: impl Into<String>) -> Self {
        Self {
            score_a: Some(score_a),
            score_b: Some(score_b),
            analysis: analysis.into(),
            ..Default::default()
        }
    }

    /// Destructure into the result for the mode that sent the request
    pub fn into_result(self, mode: Mode, names: Names) -> Result<AnalysisResult> {
        let scores = if mode.spec().dual_score {
            match (self.score_a, self.score_b) {
                (Some(a), Some(b)) => vec![a, b],
                _ => {
                    return Err(TasteError::DecodeError(
                        "battle response is missing scoreA or scoreB".to_string(),
                    ))
                }
            }
        } else {
            match self.score {
                Some(score) => vec![score],
                None => {
                    return Err(TasteError::DecodeError(
                        "response is missing score".to_string(),
                    ))
                }
            }
        };
        AnalysisResult::from_names(mode, names, &scores, self.analysis)
    }
}

/// Body of `POST /generate_audio`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AudioRequest {
    pub dialogue: String,
}

/// Response of `POST /generate_audio`; `audio` is base64 MP3 when present
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AudioResponse {
    #[serde(default)]
    pub audio: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blob(name: &str, bytes: &[u8]) -> ImageBlob {
        ImageBlob::new(name, "image/jpeg", bytes.to_vec())
    }

    #[test]
    fn test_not_ready_is_rejected() {
        let mut session = Session::new();
        session.select_mode(Mode::Single);
        session.feedback_style = Some("roasting".into());
        assert!(AnalysisRequest::prepare(&session).is_err());
    }

    #[test]
    fn test_single_payload() {
        let mut session = Session::new();
        session.select_mode(Mode::Single);
        session.submit_image(Mode::Single, 0, blob("a.jpg", b"hi")).unwrap();
        session.names.user_name = "  Kim ".into();
        session.feedback_style = Some("encouraging".into());

        let prepared = AnalysisRequest::prepare(&session).unwrap();
        let value = serde_json::to_value(&prepared.request).unwrap();
        assert_eq!(
            value,
            json!({
                "mode": "single",
                "style": "encouraging",
                "userName": "Kim",
                "images": ["aGk="],
            })
        );
    }

    #[test]
    fn test_battle_skips_unset_slot() {
        let mut session = Session::new();
        session.select_mode(Mode::Battle);
        session.submit_image(Mode::Battle, 1, blob("b.jpg", b"B")).unwrap();
        session.feedback_style = Some("sarcastic".into());

        let images: Vec<String> = session.images.populated().map(encode_image).collect();
        assert_eq!(images, vec![STANDARD.encode(b"B")]);
    }

    #[test]
    fn test_battle_payload_order_and_default_names() {
        let mut session = Session::new();
        session.select_mode(Mode::Battle);
        session.submit_image(Mode::Battle, 1, blob("b.jpg", b"second")).unwrap();
        session.submit_image(Mode::Battle, 0, blob("a.jpg", b"first")).unwrap();
        session.names.name_b = "Ben".into();
        session.feedback_style = Some("roasting".into());

        let prepared = AnalysisRequest::prepare(&session).unwrap();
        let request = &prepared.request;
        assert_eq!(
            request.images.as_deref().unwrap(),
            &[STANDARD.encode(b"first"), STANDARD.encode(b"second")]
        );
        assert_eq!(request.name_a.as_deref(), Some("Person 1"));
        assert_eq!(request.name_b.as_deref(), Some("Ben"));
        assert!(request.user_name.is_none());

        let value = serde_json::to_value(request).unwrap();
        assert!(value.get("nameA").is_some());
        assert!(value.get("userName").is_none());
        assert!(value.get("answers").is_none());
    }

    #[test]
    fn test_evolution_keeps_relative_order_with_gap() {
        let mut session = Session::new();
        session.select_mode(Mode::Evolution);
        session.submit_image(Mode::Evolution, 2, blob("c.jpg", b"c")).unwrap();
        session.submit_image(Mode::Evolution, 0, blob("a.jpg", b"a")).unwrap();
        session.feedback_style = Some("analytical".into());

        let prepared = AnalysisRequest::prepare(&session).unwrap();
        assert_eq!(
            prepared.request.images.unwrap(),
            vec![STANDARD.encode(b"a"), STANDARD.encode(b"c")]
        );
    }

    #[test]
    fn test_manual_payload() {
        let mut session = Session::new();
        session.select_mode(Mode::Manual);
        session
            .submit_answers(["Bjork", "Homogenic", "Joga", "", "", "art pop"])
            .unwrap();
        session.feedback_style = Some("podcast".into());

        let prepared = AnalysisRequest::prepare(&session).unwrap();
        let value = serde_json::to_value(&prepared.request).unwrap();
        assert_eq!(value["mode"], "manual");
        assert_eq!(value["userName"], "");
        assert_eq!(value["answers"]["favoriteArtist"], "Bjork");
        assert_eq!(value["answers"]["currentArtist"], "");
        assert!(value.get("images").is_none());
    }

    #[test]
    fn test_prepare_is_repeatable() {
        let mut session = Session::new();
        session.select_mode(Mode::Single);
        session.submit_image(Mode::Single, 0, blob("a.jpg", b"x")).unwrap();
        session.feedback_style = Some("roasting".into());

        let first = AnalysisRequest::prepare(&session).unwrap();
        let second = AnalysisRequest::prepare(&session).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_response_single() {
        let response: AnalysisResponse =
            serde_json::from_value(json!({"score": 87, "analysis": "Solid."})).unwrap();
        let result = response
            .into_result(Mode::Single, Names::Single("Kim".into()))
            .unwrap();
        assert_eq!(
            result,
            AnalysisResult::Single {
                mode: Mode::Single,
                score: 87.0,
                analysis: "Solid.".into()
            }
        );
    }

    #[test]
    fn test_response_battle() {
        let response: AnalysisResponse =
            serde_json::from_value(json!({"scoreA": 60, "scoreB": 80, "analysis": "B wins"}))
                .unwrap();
        let names = Names::Pair {
            name_a: "Ana".into(),
            name_b: "Ben".into(),
        };
        let result = response.into_result(Mode::Battle, names).unwrap();
        assert_eq!(result.score_targets(), vec![60, 80]);
    }

    #[test]
    fn test_response_missing_scores() {
        let names = Names::Pair {
            name_a: "Ana".into(),
            name_b: "Ben".into(),
        };
        let err = AnalysisResponse::single(50.0, "x")
            .into_result(Mode::Battle, names)
            .unwrap_err();
        assert!(matches!(err, TasteError::DecodeError(_)));

        let err = AnalysisResponse::battle(1.0, 2.0, "x")
            .into_result(Mode::Manual, Names::Single(String::new()))
            .unwrap_err();
        assert!(matches!(err, TasteError::DecodeError(_)));
    }

    #[test]
    fn test_audio_response_absent_audio() {
        let response: AudioResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.audio.is_none());
        let body = serde_json::to_value(AudioRequest {
            dialogue: "HOST: hi".into(),
        })
        .unwrap();
        assert_eq!(body, json!({"dialogue": "HOST: hi"}));
    }
}
