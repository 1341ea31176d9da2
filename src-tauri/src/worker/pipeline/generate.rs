use std::time::Instant;

use ndarray::{Array2, ArrayD};
use ort::inputs;
use ort::value::TensorRef;

use super::config::{PipelineError, Translation};
use super::model::MarianModel;
use super::Pipeline;

/// Arg-max over `logits`, skipping `banned`. Returns the chosen index and its
/// log-probability under a softmax over the full row.
pub fn greedy_pick(logits: &[f32], banned: Option<usize>) -> Option<(usize, f32)> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return None;
    }
    let log_z = max + logits.iter().map(|&l| (l - max).exp()).sum::<f32>().ln();

    let mut best: Option<(usize, f32)> = None;
    for (idx, &logit) in logits.iter().enumerate() {
        if Some(idx) == banned {
            continue;
        }
        match best {
            Some((_, score)) if score >= logit => {}
            _ => best = Some((idx, logit)),
        }
    }
    best.map(|(idx, logit)| (idx, logit - log_z))
}

impl MarianModel {
    fn encode(
        &mut self,
        input_ids: &Array2<i64>,
        attention_mask: &Array2<i64>,
    ) -> Result<ArrayD<f32>, PipelineError> {
        let start = Instant::now();
        let outputs = self.encoder.run(inputs![
            "input_ids" => TensorRef::from_array_view(input_ids.view())?,
            "attention_mask" => TensorRef::from_array_view(attention_mask.view())?,
        ])?;
        log::debug!("Encoder inference completed in {:?}", start.elapsed());

        Ok(outputs
            .get("last_hidden_state")
            .ok_or_else(|| PipelineError::OutputNotFound("last_hidden_state".into()))?
            .try_extract_array::<f32>()?
            .to_owned())
    }

    fn next_token(
        &mut self,
        decoder_ids: &[i64],
        attention_mask: &Array2<i64>,
        hidden: &ArrayD<f32>,
    ) -> Result<Option<(usize, f32)>, PipelineError> {
        let steps = decoder_ids.len();
        let banned = usize::try_from(self.special.pad).ok();
        let input_ids = Array2::from_shape_vec((1, steps), decoder_ids.to_vec())?;

        let outputs = self.decoder.run(inputs![
            "input_ids" => TensorRef::from_array_view(input_ids.view())?,
            "encoder_attention_mask" => TensorRef::from_array_view(attention_mask.view())?,
            "encoder_hidden_states" => TensorRef::from_array_view(hidden.view())?,
        ])?;

        let logits = outputs
            .get("logits")
            .ok_or_else(|| PipelineError::OutputNotFound("logits".into()))?
            .try_extract_array::<f32>()?;
        let last: Vec<f32> = logits
            .slice(ndarray::s![0, steps - 1, ..])
            .iter()
            .copied()
            .collect();

        Ok(greedy_pick(&last, banned))
    }

    fn detokenize(&self, ids: &[u32]) -> Result<String, PipelineError> {
        self.tokenizer
            .decode(ids, true)
            .map_err(|e| PipelineError::Tokenizer(e.to_string()))
    }
}

impl Pipeline for MarianModel {
    fn translate(
        &mut self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        on_partial: &mut dyn FnMut(&str),
    ) -> Result<Translation, PipelineError> {
        let start = Instant::now();
        log::debug!(
            "Translating {} chars ({source_lang} -> {target_lang})",
            text.chars().count()
        );

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| PipelineError::Tokenizer(e.to_string()))?;
        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let len = ids.len();
        let input_ids = Array2::from_shape_vec((1, len), ids)?;
        let attention_mask = Array2::<i64>::ones((1, len));
        let hidden = self.encode(&input_ids, &attention_mask)?;

        let mut decoder_ids = vec![self.special.decoder_start];
        let mut generated: Vec<u32> = Vec::new();
        let mut log_prob_sum = 0.0f32;

        while generated.len() < self.max_length {
            let Some((token, log_prob)) = self.next_token(&decoder_ids, &attention_mask, &hidden)?
            else {
                break;
            };
            if token as i64 == self.special.eos {
                break;
            }

            decoder_ids.push(token as i64);
            generated.push(token as u32);
            log_prob_sum += log_prob;
            on_partial(&self.detokenize(&generated)?);
        }

        let text = self.detokenize(&generated)?;
        let confidence =
            (!generated.is_empty()).then(|| (log_prob_sum / generated.len() as f32).exp());

        log::info!(
            "Translated into {} tokens in {:?}",
            generated.len(),
            start.elapsed()
        );
        Ok(Translation { text, confidence })
    }
}
