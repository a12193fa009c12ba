//! Builds the shuffled multiple-choice question list from pooled player tracks.

use std::collections::HashSet;

use rand::{Rng, seq::SliceRandom};

use crate::dao::models::{Question, Track};

/// Number of wrong titles offered next to the correct one.
pub const DISTRACTOR_COUNT: usize = 3;
/// Playback never starts later than this before the end of the track.
const PREVIEW_TAIL_MS: u64 = 15_000;

/// Build up to `max_questions` questions from the pooled tracks of a room.
///
/// Tracks without an id are dropped and duplicates (same id) kept once. The pool is
/// shuffled first; distractors are distinct titles of other pooled tracks.
pub fn generate_questions<R: Rng + ?Sized>(
    mut pool: Vec<Track>,
    max_questions: usize,
    rng: &mut R,
) -> Vec<Question> {
    let mut seen = HashSet::new();
    pool.retain(|track| !track.id.is_empty() && seen.insert(track.id.clone()));
    pool.shuffle(rng);

    let mut questions: Vec<Question> = Vec::new();
    for track in &pool {
        if questions.len() >= max_questions {
            break;
        }

        let Some(mut options) = pick_distractors(&pool, track, rng) else {
            continue;
        };
        options.push(track.name.clone());
        options.shuffle(rng);

        questions.push(Question {
            id: format!("q{}", questions.len() + 1),
            track_id: track.id.clone(),
            track_name: track.name.clone(),
            answer_options: options,
            correct_answer: track.name.clone(),
            playback_start_offset_ms: playback_offset(track.duration_ms, rng),
        });
    }

    questions
}

fn pick_distractors<R: Rng + ?Sized>(pool: &[Track], track: &Track, rng: &mut R) -> Option<Vec<String>> {
    let mut candidates: Vec<&str> = Vec::new();
    for other in pool {
        let title = other.name.as_str();
        if other.id != track.id && title != track.name && !candidates.contains(&title) {
            candidates.push(title);
        }
    }
    if candidates.len() < DISTRACTOR_COUNT {
        return None;
    }

    candidates.shuffle(rng);
    Some(
        candidates
            .into_iter()
            .take(DISTRACTOR_COUNT)
            .map(str::to_string)
            .collect(),
    )
}

fn playback_offset<R: Rng + ?Sized>(duration_ms: u64, rng: &mut R) -> u64 {
    let latest = duration_ms.saturating_sub(PREVIEW_TAIL_MS);
    rng.random_range(0..=latest)
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn track(id: &str, name: &str, duration_ms: u64) -> Track {
        Track {
            id: id.into(),
            name: name.into(),
            artists: vec!["Artist".into()],
            duration_ms,
        }
    }

    fn pool(size: usize) -> Vec<Track> {
        (1..=size)
            .map(|n| track(&format!("t{n}"), &format!("Song {n}"), 200_000))
            .collect()
    }

    #[test]
    fn questions_have_four_unique_options_including_the_answer() {
        let mut rng = StdRng::seed_from_u64(7);
        let questions = generate_questions(pool(6), 10, &mut rng);
        assert_eq!(questions.len(), 6);

        for (position, question) in questions.iter().enumerate() {
            assert_eq!(question.id, format!("q{}", position + 1));
            assert_eq!(question.answer_options.len(), DISTRACTOR_COUNT + 1);
            let unique: HashSet<_> = question.answer_options.iter().collect();
            assert_eq!(unique.len(), DISTRACTOR_COUNT + 1);
            assert!(question.answer_options.contains(&question.correct_answer));
            assert_eq!(question.correct_answer, question.track_name);
            assert!(question.playback_start_offset_ms <= 185_000);
        }
    }

    #[test]
    fn question_count_is_capped() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(generate_questions(pool(12), 5, &mut rng).len(), 5);
    }

    #[test]
    fn tracks_with_too_few_distinct_alternatives_are_skipped() {
        let mut rng = StdRng::seed_from_u64(3);
        let tracks = vec![
            track("t1", "Same", 100_000),
            track("t2", "Same", 100_000),
            track("t3", "Other", 100_000),
            track("t4", "Third", 100_000),
        ];
        // Every track has only two distinct titles to borrow from.
        assert!(generate_questions(tracks, 10, &mut rng).is_empty());
    }

    #[test]
    fn tracks_without_id_are_skipped() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut tracks = pool(4);
        tracks.push(track("", "Nameless", 100_000));
        let questions = generate_questions(tracks, 10, &mut rng);
        assert_eq!(questions.len(), 4);
        assert!(questions.iter().all(|q| !q.answer_options.contains(&"Nameless".to_string())));
    }

    #[test]
    fn tracks_shared_by_several_players_are_asked_once() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut tracks = pool(4);
        tracks.extend(pool(4));
        let questions = generate_questions(tracks, 10, &mut rng);
        assert_eq!(questions.len(), 4);
        let ids: HashSet<_> = questions.iter().map(|q| q.track_id.as_str()).collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn short_tracks_start_at_the_beginning() {
        let mut rng = StdRng::seed_from_u64(9);
        let tracks = vec![
            track("t1", "A", 10_000),
            track("t2", "B", 0),
            track("t3", "C", 14_999),
            track("t4", "D", 15_000),
        ];
        for question in generate_questions(tracks, 10, &mut rng) {
            assert_eq!(question.playback_start_offset_ms, 0);
        }
    }
}
