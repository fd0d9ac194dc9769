use crate::models::{ContentRequest, ExplainRequest, LessonPlanRequest, ModelPrompt, WorksheetRequest};
use crate::services::worksheets::WORKSHEET_DELIMITER;

pub fn worksheet_prompt(req: &WorksheetRequest) -> ModelPrompt {
    let text = format!(
        "You are an expert teacher creating differentiated worksheets.\n\
         You will receive an image of a textbook page, a list of grade levels, and a language.\n\
         Your task is to generate a worksheet for EACH grade level.\n\n\
         Grade Levels: {grades}\n\
         Language: {language}\n\n\
         Follow these instructions EXACTLY:\n\
         1. For each grade level, you will create one block of text.\n\
         2. The first line of the block MUST be the grade level number ONLY. For example: 10\n\
         3. The rest of the block is the worksheet content for that grade level, in {language}.\n\
         4. You MUST separate each grade level's block with the exact delimiter on its own line:\n\
         {delim}\n\n\
         Example for grade levels '9, 10':\n\n\
         9\n\
         Worksheet content for 9th grade goes here. It can contain any characters, quotes like \"this\", and multiple lines.\n\
         {delim}\n\
         10\n\
         Worksheet content for 10th grade goes here.\n\n\
         Do NOT output JSON. Do NOT use markdown. Follow the format precisely.",
        grades = req.grade_levels,
        language = req.language,
        delim = WORKSHEET_DELIMITER,
    );

    ModelPrompt {
        text,
        images: vec![req.textbook_page_image.clone()],
    }
}

pub fn lesson_plan_prompt(req: &LessonPlanRequest) -> ModelPrompt {
    ModelPrompt::text(format!(
        "You are an experienced teacher creating a weekly lesson plan for the topic \"{topic}\" \
         for grade level \"{grade}\". The lesson plan must be written in {language}.\n\n\
         Include daily activities and learning objectives appropriate for the grade level, \
         differentiated activities for diverse learners, activities that build critical thinking, \
         and assessments to measure understanding.\n\n\
         Respond with a single JSON object and nothing else, using exactly these keys:\n\
         {{\n  \"title\": string,\n  \"gradeLevel\": string,\n  \"subject\": string,\n  \
         \"weekOverview\": string,\n  \"weekObjectives\": [string],\n  \"materials\": [string],\n  \
         \"dailyPlan\": [{{\"day\": string, \"topic\": string, \"learningObjectives\": [string], \
         \"activities\": [string], \"materials\": [string], \"assessment\": string, \
         \"differentiation\": {{\"support\": string, \"challenge\": string}}}}],\n  \
         \"assessment\": {{\"formative\": [string], \"summative\": string}}\n}}\n\
         Escape line breaks inside string values as \\n.",
        topic = req.topic.trim(),
        grade = req.grade_level.trim(),
        language = req.language,
    ))
}

pub fn content_prompt(req: &ContentRequest) -> ModelPrompt {
    ModelPrompt::text(format!(
        "You are an expert in generating hyper-local content for teachers in India.\n\n\
         A teacher will make a request in their local language, and you will generate simple, \
         culturally relevant content.\n\n\
         Language: {language}\n\
         Request: {request}\n\n\
         Content:",
        language = req.language,
        request = req.request.trim(),
    ))
}

pub fn explain_prompt(req: &ExplainRequest) -> ModelPrompt {
    ModelPrompt::text(format!(
        "You are a helpful assistant that provides simple, accurate explanations for complex \
         student questions in the local language, complete with easy-to-understand analogies.\n\n\
         Question: {question}\n\
         Language: {language}\n\n\
         Provide a clear and concise explanation in the specified language, using analogies to \
         make the concept easier to understand.",
        question = req.question.trim(),
        language = req.language,
    ))
}
